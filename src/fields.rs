//! Declaring the fields shown under `Properties:`.
//!
//! Rust has no runtime reflection, so each error type lists its inspectable
//! fields explicitly in [`Exception::describe`]. The list is built once per
//! concrete type and cached by the [`Registry`](crate::registry::Registry).
//!
//! ```
//! use std::borrow::Cow;
//!
//! use faultline::{Exception, fields::Fields};
//!
//! struct QuotaExceeded {
//!     tenant: String,
//!     limit: u32,
//! }
//!
//! impl Exception for QuotaExceeded {
//!     fn message(&self) -> Cow<'_, str> {
//!         Cow::Borrowed("quota exceeded")
//!     }
//!
//!     fn describe(&self) -> Fields {
//!         Fields::new()
//!             .field("Tenant", |e: &Self| e.tenant.clone())
//!             .field("Limit", |e: &Self| e.limit)
//!     }
//! }
//!
//! let error = QuotaExceeded { tenant: "acme".into(), limit: 10 };
//! let text = faultline::format_to_string(&error);
//! assert!(text.contains("\nProperties:\n   Tenant: acme\n   Limit: 10"));
//! ```
//!
//! # Well-known names
//!
//! Two names pick up special formatting automatically:
//!
//! - `HResult` is rendered as `0x` followed by eight uppercase hex digits.
//! - `HelpLink` is left out of the report entirely when it is empty.

use alloc::{borrow::Cow, vec::Vec};
use core::{any::Any, fmt};

pub use faultline_internals::field::{FieldError, FieldFormat, FieldValue, RawField};

/// Field name rendered in hexadecimal.
pub const RESULT_CODE_FIELD: &str = "HResult";

/// Field name omitted from the report when it has no value.
pub const HELP_LINK_FIELD: &str = "HelpLink";

/// The fields of one concrete error type, in declaration order.
#[derive(Debug, Default)]
pub struct Fields {
    fields: Vec<RawField>,
}

impl Fields {
    /// Creates an empty field list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty field list; the default for [`Exception::describe`].
    ///
    /// [`Exception::describe`]: crate::Exception::describe
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a field whose value can always be read.
    #[must_use]
    pub fn field<E, V, F>(self, name: impl Into<Cow<'static, str>>, accessor: F) -> Self
    where
        E: Any,
        V: Into<FieldValue>,
        F: Fn(&E) -> V + 'static + Send + Sync,
    {
        self.try_field(name, move |target: &E| {
            Ok::<_, core::convert::Infallible>(accessor(target))
        })
    }

    /// Adds a field whose accessor may fail.
    ///
    /// A failure does not abort the report: the failure's message is shown
    /// as the field's value instead.
    #[must_use]
    pub fn try_field<E, V, Err, F>(self, name: impl Into<Cow<'static, str>>, accessor: F) -> Self
    where
        E: Any,
        V: Into<FieldValue>,
        Err: fmt::Display,
        F: Fn(&E) -> Result<V, Err> + 'static + Send + Sync,
    {
        let field = RawField::new::<E, _>(name, move |target: &E| {
            accessor(target).map(Into::into).map_err(FieldError::new)
        });
        self.push(apply_name_rules(field))
    }

    /// Adds a field that is always rendered in hexadecimal.
    #[must_use]
    pub fn hex_field<E, V, F>(self, name: impl Into<Cow<'static, str>>, accessor: F) -> Self
    where
        E: Any,
        V: Into<FieldValue>,
        F: Fn(&E) -> V + 'static + Send + Sync,
    {
        let field = RawField::new::<E, _>(name, move |target: &E| Ok(accessor(target).into()))
            .with_format(FieldFormat::Hex8);
        self.push(field)
    }

    /// Adds a field that is left out of the report when it has no value.
    #[must_use]
    pub fn optional_field<E, V, F>(self, name: impl Into<Cow<'static, str>>, accessor: F) -> Self
    where
        E: Any,
        V: Into<FieldValue>,
        F: Fn(&E) -> V + 'static + Send + Sync,
    {
        let field = RawField::new::<E, _>(name, move |target: &E| Ok(accessor(target).into()))
            .with_omit_when_absent(true);
        self.push(field)
    }

    /// Adds a prebuilt field as is.
    #[must_use]
    pub fn push(mut self, field: RawField) -> Self {
        self.fields.push(field);
        self
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over the declared fields.
    pub fn iter(&self) -> core::slice::Iter<'_, RawField> {
        self.fields.iter()
    }

    pub(crate) fn into_vec(self) -> Vec<RawField> {
        self.fields
    }
}

impl<'a> IntoIterator for &'a Fields {
    type IntoIter = core::slice::Iter<'a, RawField>;
    type Item = &'a RawField;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn apply_name_rules(field: RawField) -> RawField {
    match field.name() {
        RESULT_CODE_FIELD => field.with_format(FieldFormat::Hex8),
        HELP_LINK_FIELD => field.with_omit_when_absent(true),
        _ => field,
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;

    struct Sample {
        code: i32,
        link: Option<String>,
    }

    #[test]
    fn test_name_rules() {
        let fields = Fields::new()
            .field(RESULT_CODE_FIELD, |s: &Sample| s.code)
            .field(HELP_LINK_FIELD, |s: &Sample| s.link.clone())
            .field("Other", |s: &Sample| s.code);
        let formats: Vec<_> = fields
            .iter()
            .map(|f| (f.name(), f.format(), f.omit_when_absent()))
            .collect();
        assert_eq!(
            formats,
            [
                ("HResult", FieldFormat::Hex8, false),
                ("HelpLink", FieldFormat::Display, true),
                ("Other", FieldFormat::Display, false),
            ]
        );
    }

    #[test]
    fn test_try_field_error_message() {
        let fields = Fields::new().try_field("Broken", |_: &Sample| Err::<i32, _>("cannot read"));
        let sample = Sample {
            code: 1,
            link: None,
        };
        let field = fields.iter().next().unwrap();
        assert_eq!(field.read(&sample).unwrap_err().message(), "cannot read");
    }

    #[test]
    fn test_explicit_overrides() {
        let fields = Fields::new()
            .hex_field("Status", |s: &Sample| s.code)
            .optional_field("Link", |s: &Sample| s.link.clone());
        assert_eq!(fields.len(), 2);
        let mut iter = fields.iter();
        assert_eq!(iter.next().unwrap().format(), FieldFormat::Hex8);
        assert!(iter.next().unwrap().omit_when_absent());
    }
}
