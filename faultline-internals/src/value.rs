//! Dynamically typed values for shape-based introspection.
//!
//! Shapes describe types that `faultline` has no compile-time dependency on.
//! Reading a member of such a type produces a [`Value`], which is then
//! checked against what the caller expected before being used.

use alloc::{borrow::Cow, boxed::Box, string::String, vec::Vec};
use core::{
    any::{Any, TypeId},
    fmt,
    marker::PhantomData,
};

/// The declared type of a shape member.
///
/// Two declarations are compatible only if they are equal, which is how a
/// probe tells a matching shape from one that merely has the right names.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A boolean.
    Bool,
    /// A string.
    String,
    /// An object of any type.
    Object,
    /// A runtime type descriptor.
    Type,
    /// A type registered under the given name.
    Named(Cow<'static, str>),
    /// A sequence that can only be iterated.
    Enumerable(Box<TypeRef>),
    /// A sequence with a known length.
    Collection(Box<TypeRef>),
}

impl TypeRef {
    /// Refers to the type registered under `name`.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Named(name.into())
    }

    /// An enumerable of `item`.
    #[must_use]
    pub fn enumerable_of(item: TypeRef) -> Self {
        Self::Enumerable(Box::new(item))
    }

    /// A collection of `item`.
    #[must_use]
    pub fn collection_of(item: TypeRef) -> Self {
        Self::Collection(Box::new(item))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::String => f.write_str("string"),
            Self::Object => f.write_str("object"),
            Self::Type => f.write_str("type"),
            Self::Named(name) => f.write_str(name),
            Self::Enumerable(item) => write!(f, "Enumerable<{item}>"),
            Self::Collection(item) => write!(f, "Collection<{item}>"),
        }
    }
}

/// A type as observed at runtime.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RuntimeType {
    /// Identity of the type.
    id: TypeId,
    /// Human-readable name of the type.
    name: Cow<'static, str>,
}

impl RuntimeType {
    /// Creates a runtime type from its parts.
    pub fn new(id: TypeId, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// The runtime type of `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self::new(TypeId::of::<T>(), core::any::type_name::<T>())
    }

    /// The identity of the type.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The name of the type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A borrowed object whose concrete type is only known at runtime.
#[derive(Copy, Clone, Debug)]
pub struct ObjectRef<'a> {
    /// The object itself.
    value: &'a dyn Any,
    /// The name of the object's concrete type.
    type_name: &'static str,
}

impl<'a> ObjectRef<'a> {
    /// Borrows `value` as an object.
    pub fn new<T: Any>(value: &'a T) -> Self {
        Self {
            value,
            type_name: core::any::type_name::<T>(),
        }
    }

    /// The object, ready to be handed to a [`PropertyGetter`].
    #[must_use]
    pub fn value(&self) -> &'a dyn Any {
        self.value
    }

    /// The concrete type of the object.
    #[must_use]
    pub fn runtime_type(&self) -> RuntimeType {
        RuntimeType::new(self.value.type_id(), self.type_name)
    }
}

/// A dynamically typed value read through a shape.
#[derive(Clone, Debug)]
pub enum Value<'a> {
    /// No value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A string.
    Str(Cow<'a, str>),
    /// An object.
    Object(ObjectRef<'a>),
    /// A sequence of values.
    Sequence(Vec<Value<'a>>),
    /// A runtime type descriptor.
    Type(RuntimeType),
}

impl<'a> Value<'a> {
    /// Borrows `value` as an object value.
    pub fn object<T: Any>(value: &'a T) -> Self {
        Self::Object(ObjectRef::new(value))
    }

    /// Collects objects into a sequence value.
    pub fn objects<T, I>(values: I) -> Self
    where
        T: Any,
        I: IntoIterator<Item = &'a T>,
    {
        Self::Sequence(values.into_iter().map(Self::object).collect())
    }

    /// A short name for the kind of this value, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
            Self::Object(_) => "object",
            Self::Sequence(_) => "sequence",
            Self::Type(_) => "type",
        }
    }

    /// Expects a boolean.
    pub fn into_bool(self) -> Result<bool, ShapeError> {
        match self {
            Self::Bool(value) => Ok(value),
            other => Err(ShapeError::unexpected("bool", &other)),
        }
    }

    /// Expects a string. `Null` is read as the empty string.
    pub fn into_str(self) -> Result<Cow<'a, str>, ShapeError> {
        match self {
            Self::Str(value) => Ok(value),
            Self::Null => Ok(Cow::Borrowed("")),
            other => Err(ShapeError::unexpected("string", &other)),
        }
    }

    /// Expects an object.
    pub fn into_object(self) -> Result<ObjectRef<'a>, ShapeError> {
        match self {
            Self::Object(value) => Ok(value),
            other => Err(ShapeError::unexpected("object", &other)),
        }
    }

    /// Expects a sequence.
    pub fn into_sequence(self) -> Result<Vec<Value<'a>>, ShapeError> {
        match self {
            Self::Sequence(values) => Ok(values),
            other => Err(ShapeError::unexpected("sequence", &other)),
        }
    }

    /// Expects a runtime type.
    pub fn into_type(self) -> Result<RuntimeType, ShapeError> {
        match self {
            Self::Type(value) => Ok(value),
            other => Err(ShapeError::unexpected("type", &other)),
        }
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(Cow::Borrowed(value))
    }
}

impl From<String> for Value<'_> {
    fn from(value: String) -> Self {
        Self::Str(Cow::Owned(value))
    }
}

impl From<RuntimeType> for Value<'_> {
    fn from(value: RuntimeType) -> Self {
        Self::Type(value)
    }
}

/// Errors raised while reading values through a shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShapeError {
    /// A getter was handed an object of a type it was not registered for.
    TargetMismatch {
        /// The type the getter was registered for.
        expected: &'static str,
    },
    /// A value had a different kind than the shape declared.
    UnexpectedValue {
        /// The kind the caller expected.
        expected: &'static str,
        /// The kind that was found.
        found: &'static str,
    },
    /// A method was invoked with the wrong number of arguments.
    ArityMismatch {
        /// The declared number of parameters.
        expected: usize,
        /// The number of arguments passed.
        found: usize,
    },
}

impl ShapeError {
    /// Creates an [`UnexpectedValue`](ShapeError::UnexpectedValue) error.
    #[must_use]
    pub fn unexpected(expected: &'static str, found: &Value<'_>) -> Self {
        Self::UnexpectedValue {
            expected,
            found: found.kind(),
        }
    }
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetMismatch { expected } => {
                write!(f, "getter expected an object of type {expected}")
            }
            Self::UnexpectedValue { expected, found } => {
                write!(f, "expected a {expected} value, found {found}")
            }
            Self::ArityMismatch { expected, found } => {
                write!(f, "expected {expected} arguments, found {found}")
            }
        }
    }
}

impl core::error::Error for ShapeError {}

/// Erased read access to one property of a shaped type.
pub trait PropertyGetter: 'static + Send + Sync {
    /// Reads the property from `target`.
    fn get<'a>(&self, target: &'a dyn Any) -> Result<Value<'a>, ShapeError>;
}

/// A typed getter closure together with the type it reads from.
///
/// Created with [`TypedGetter::new`] and usually stored as a
/// `dyn PropertyGetter`.
pub struct TypedGetter<T, F> {
    /// The typed getter.
    getter: F,
    /// The concrete type `F` accepts.
    _target: PhantomData<fn(&T)>,
}

impl<T, F> TypedGetter<T, F>
where
    T: Any,
    F: for<'a> Fn(&'a T) -> Value<'a> + 'static + Send + Sync,
{
    /// Wraps a typed getter.
    pub fn new(getter: F) -> Self {
        Self {
            getter,
            _target: PhantomData,
        }
    }
}

impl<T, F> PropertyGetter for TypedGetter<T, F>
where
    T: Any,
    F: for<'a> Fn(&'a T) -> Value<'a> + 'static + Send + Sync,
{
    fn get<'a>(&self, target: &'a dyn Any) -> Result<Value<'a>, ShapeError> {
        let target = target
            .downcast_ref::<T>()
            .ok_or(ShapeError::TargetMismatch {
                expected: core::any::type_name::<T>(),
            })?;
        Ok((self.getter)(target))
    }
}

/// Erased invocation of a static method of a shaped type.
pub trait MethodInvoker: 'static + Send + Sync {
    /// Invokes the method with `args`.
    fn invoke<'a>(&self, args: &[Value<'a>]) -> Result<Value<'a>, ShapeError>;
}

/// A method closure wrapped for storage as a `dyn MethodInvoker`.
pub struct FnInvoker<F> {
    /// The method body.
    body: F,
}

impl<F> FnInvoker<F>
where
    F: for<'a, 'b> Fn(&'b [Value<'a>]) -> Result<Value<'a>, ShapeError> + 'static + Send + Sync,
{
    /// Wraps a method body.
    pub fn new(body: F) -> Self {
        Self { body }
    }
}

impl<F> MethodInvoker for FnInvoker<F>
where
    F: for<'a, 'b> Fn(&'b [Value<'a>]) -> Result<Value<'a>, ShapeError> + 'static + Send + Sync,
{
    fn invoke<'a>(&self, args: &[Value<'a>]) -> Result<Value<'a>, ShapeError> {
        (self.body)(args)
    }
}
