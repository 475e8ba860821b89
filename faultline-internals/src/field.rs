//! Type-erased field accessors.
//!
//! A [`RawField`] is created once per field of a concrete error type and
//! afterwards only ever sees that type through `&dyn Any`. The typed closure
//! is wrapped in an [`Accessor`] which performs the downcast before calling
//! it.

use alloc::{
    borrow::Cow,
    boxed::Box,
    format,
    string::{String, ToString},
};
use core::{
    any::{Any, TypeId},
    fmt,
    marker::PhantomData,
};

/// The value read from one field of an error.
///
/// Conversions exist from the usual primitive and string types, so accessor
/// closures rarely need to name this type explicitly:
///
/// ```
/// use faultline_internals::FieldValue;
///
/// assert_eq!(FieldValue::from(5i32), FieldValue::Integer(5));
/// assert_eq!(FieldValue::from(None::<&str>), FieldValue::Null);
/// assert_eq!(FieldValue::from("x"), FieldValue::Text("x".into()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum FieldValue {
    /// The field has no value.
    #[default]
    Null,
    /// An integer, eligible for hexadecimal formatting.
    Integer(i64),
    /// Any other value, already turned into text.
    Text(String),
}

impl FieldValue {
    /// Creates a text value from anything implementing [`Display`].
    ///
    /// [`Display`]: core::fmt::Display
    pub fn display(value: impl fmt::Display) -> Self {
        Self::Text(value.to_string())
    }

    /// Returns `true` for [`FieldValue::Null`] and for empty text.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            Self::Integer(_) => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("[null]"),
            Self::Integer(value) => fmt::Display::fmt(value, f),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<Cow<'_, str>> for FieldValue {
    fn from(value: Cow<'_, str>) -> Self {
        Self::Text(value.into_owned())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Text(if value { "True" } else { "False" }.into())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(value) => Self::Integer(value),
            Err(_) => Self::Text(value.to_string()),
        }
    }
}

impl From<usize> for FieldValue {
    fn from(value: usize) -> Self {
        Self::from(value as u64)
    }
}

/// Implements `From<$ty>` for [`FieldValue`] via a lossless `i64` conversion.
macro_rules! integer_field_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    Self::Integer(i64::from(value))
                }
            }
        )*
    };
}

integer_field_value!(i8, i16, i32, i64, u8, u16, u32);

impl<T> From<Option<T>> for FieldValue
where
    T: Into<FieldValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// How a [`FieldValue`] is rendered as text.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum FieldFormat {
    /// The value's own [`Display`](core::fmt::Display) text.
    #[default]
    Display,
    /// `0x` followed by at least eight uppercase hexadecimal digits.
    ///
    /// Values that fit in 32 bits are shown as their 32-bit two's-complement
    /// pattern, so `-2147467259` becomes `0x80004005`. Non-integer values
    /// fall back to [`FieldFormat::Display`].
    Hex8,
}

impl FieldFormat {
    /// Renders `value` according to this format.
    ///
    /// ```
    /// use faultline_internals::{FieldFormat, FieldValue};
    ///
    /// let code = FieldValue::Integer(5);
    /// assert_eq!(FieldFormat::Hex8.render(&code), "0x00000005");
    /// assert_eq!(FieldFormat::Display.render(&code), "5");
    /// ```
    #[must_use]
    pub fn render(self, value: &FieldValue) -> String {
        match (self, value) {
            (Self::Hex8, &FieldValue::Integer(value)) => {
                if (i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&value) {
                    format!("0x{:08X}", value as u32)
                } else {
                    format!("0x{:08X}", value as u64)
                }
            }
            _ => value.to_string(),
        }
    }
}

/// The reason a field could not be read.
///
/// Only the message survives into the report, so the error is stored in its
/// textual form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    /// The failure message, as produced by the failing accessor.
    message: String,
}

impl FieldError {
    /// Creates a new error from any displayable failure.
    pub fn new(message: impl fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    /// Creates the error reported when an accessor is handed a value of the
    /// wrong concrete type.
    #[must_use]
    pub fn target_mismatch(expected: &'static str) -> Self {
        Self::new(format_args!("field accessor expected a value of type {expected}"))
    }

    /// Creates an error from the payload of a caught panic.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        if let Some(message) = payload.downcast_ref::<&'static str>() {
            Self::new(message)
        } else if let Some(message) = payload.downcast_ref::<String>() {
            Self::new(message)
        } else {
            Self::new("field accessor panicked")
        }
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for FieldError {}

/// Object-safe form of a typed field accessor.
///
/// This trait is only implemented for [`Accessor<E, F>`].
trait ErasedAccessor: 'static + Send + Sync {
    /// Reads the field from `target`, failing if `target` is not an `E`.
    fn read(&self, target: &dyn Any) -> Result<FieldValue, FieldError>;
}

/// A typed accessor closure together with the type it reads from.
struct Accessor<E, F> {
    /// The typed accessor.
    accessor: F,
    /// The concrete error type `F` accepts.
    _target: PhantomData<fn(&E)>,
}

impl<E, F> ErasedAccessor for Accessor<E, F>
where
    E: Any,
    F: Fn(&E) -> Result<FieldValue, FieldError> + 'static + Send + Sync,
{
    fn read(&self, target: &dyn Any) -> Result<FieldValue, FieldError> {
        let target = target
            .downcast_ref::<E>()
            .ok_or_else(|| FieldError::target_mismatch(core::any::type_name::<E>()))?;
        (self.accessor)(target)
    }
}

/// A named, type-erased accessor for one field of one concrete error type.
///
/// # Examples
///
/// ```
/// use faultline_internals::{FieldFormat, FieldValue, RawField};
///
/// struct Timeout {
///     millis: u32,
/// }
///
/// let field = RawField::new::<Timeout, _>("Millis", |t| Ok(t.millis.into()));
/// assert_eq!(field.read(&Timeout { millis: 250 }), Ok(FieldValue::Integer(250)));
/// assert_eq!(field.format(), FieldFormat::Display);
/// ```
pub struct RawField {
    /// The name shown in front of the value.
    name: Cow<'static, str>,
    /// How the value is rendered.
    format: FieldFormat,
    /// Whether an absent value suppresses the whole line.
    omit_when_absent: bool,
    /// The [`TypeId`] of the type the accessor was created for.
    target: TypeId,
    /// The accessor itself.
    accessor: Box<dyn ErasedAccessor>,
}

impl RawField {
    /// Creates a new field for error type `E`.
    pub fn new<E, F>(name: impl Into<Cow<'static, str>>, accessor: F) -> Self
    where
        E: Any,
        F: Fn(&E) -> Result<FieldValue, FieldError> + 'static + Send + Sync,
    {
        Self {
            name: name.into(),
            format: FieldFormat::Display,
            omit_when_absent: false,
            target: TypeId::of::<E>(),
            accessor: Box::new(Accessor {
                accessor,
                _target: PhantomData,
            }),
        }
    }

    /// Sets the format used to render the value.
    #[must_use]
    pub fn with_format(mut self, format: FieldFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets whether an absent value suppresses the field entirely.
    #[must_use]
    pub fn with_omit_when_absent(mut self, omit_when_absent: bool) -> Self {
        self.omit_when_absent = omit_when_absent;
        self
    }

    /// The name of the field.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The format used to render the value.
    #[must_use]
    pub fn format(&self) -> FieldFormat {
        self.format
    }

    /// Whether an absent value suppresses the field entirely.
    #[must_use]
    pub fn omit_when_absent(&self) -> bool {
        self.omit_when_absent
    }

    /// The [`TypeId`] of the error type this field reads from.
    #[must_use]
    pub fn target(&self) -> TypeId {
        self.target
    }

    /// Reads the field from `target`.
    pub fn read(&self, target: &dyn Any) -> Result<FieldValue, FieldError> {
        self.accessor.read(target)
    }
}

impl fmt::Debug for RawField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawField")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("omit_when_absent", &self.omit_when_absent)
            .finish_non_exhaustive()
    }
}
