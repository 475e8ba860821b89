//! The capability every renderable error implements.
//!
//! An [`Exception`] exposes the parts of an error that end up in a report:
//! its message, its named fields, the causes it wraps, and a few optional
//! side channels. Everything but the message has a default, so the smallest
//! implementation is a single method:
//!
//! ```
//! use std::borrow::Cow;
//!
//! use faultline::Exception;
//!
//! struct Timeout;
//!
//! impl Exception for Timeout {
//!     fn message(&self) -> Cow<'_, str> {
//!         Cow::Borrowed("the operation timed out")
//!     }
//! }
//!
//! let text = faultline::format_to_string(&Timeout);
//! assert!(text.ends_with("Message: the operation timed out\nProperties:"));
//! ```

use alloc::{borrow::Cow, string::String, vec::Vec};
use core::any::{Any, TypeId};

use indexmap::IndexMap;

use crate::fields::Fields;

/// Key/value side data attached to an exception, in insertion order.
///
/// Rendered as the `Exception Data:` section.
pub type ExceptionData = IndexMap<String, String, rustc_hash::FxBuildHasher>;

/// An error that can be rendered by the formatting engine.
///
/// The engine never knows the concrete type of the errors it formats: a cause
/// may be of any type implementing this trait, and the per-type field list is
/// looked up by [`TypeId`] every time a new error is visited.
///
/// # Aggregates
///
/// An error whose [`inner_exceptions`](Exception::inner_exceptions) returns
/// `Some` is *aggregate-kind*. Its causes are rendered as
/// `InnerExceptions[0]:`, `InnerExceptions[1]:` and so on, and its
/// [`inner_exception`](Exception::inner_exception) is ignored.
pub trait Exception: Any + Send + Sync {
    /// The message describing the failure.
    fn message(&self) -> Cow<'_, str>;

    /// The name shown on the `Type:` line.
    fn type_name(&self) -> Cow<'static, str> {
        Cow::Borrowed(core::any::type_name::<Self>())
    }

    /// Declares the fields listed under `Properties:`.
    ///
    /// Called once per concrete type; the result is cached for the lifetime
    /// of the process. Must not depend on the state of `self`. If it formats
    /// an error of its own type, that nested call builds one more, uncached,
    /// field list.
    fn describe(&self) -> Fields {
        Fields::empty()
    }

    /// The single error that caused this one.
    fn inner_exception(&self) -> Option<&dyn Exception> {
        None
    }

    /// The parallel errors that caused this one, for aggregate-kind errors.
    fn inner_exceptions(&self) -> Option<Vec<&dyn Exception>> {
        None
    }

    /// The component or application the error originated from.
    fn origin(&self) -> Option<Cow<'_, str>> {
        None
    }

    /// Additional key/value data.
    fn data(&self) -> Option<&ExceptionData> {
        None
    }

    /// A textual stack trace, rendered verbatim.
    fn stack_trace(&self) -> Option<Cow<'_, str>> {
        None
    }
}

impl<'a> core::fmt::Debug for dyn Exception + 'a {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Exception")
            .field("type", &self.type_name())
            .field("message", &self.message())
            .finish_non_exhaustive()
    }
}

/// Returns the [`TypeId`] of the concrete type behind `exception`.
pub(crate) fn concrete_type_id(exception: &dyn Exception) -> TypeId {
    let exception: &dyn Any = exception;
    exception.type_id()
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use super::*;

    struct Plain;

    impl Exception for Plain {
        fn message(&self) -> Cow<'_, str> {
            Cow::Borrowed("plain")
        }
    }

    #[test]
    fn test_exception_object_safe() {
        static_assertions::assert_obj_safe!(Exception);
        static_assertions::assert_impl_all!(dyn Exception: Send, Sync);
    }

    #[test]
    fn test_concrete_type_id() {
        let plain = Plain;
        let exception: &dyn Exception = &plain;
        assert_eq!(concrete_type_id(exception), TypeId::of::<Plain>());

        let boxed: Box<dyn Exception> = Box::new(Plain);
        assert_eq!(concrete_type_id(&*boxed), TypeId::of::<Plain>());
    }

    #[test]
    fn test_defaults() {
        let plain = Plain;
        assert!(plain.type_name().ends_with("Plain"));
        assert!(plain.inner_exception().is_none());
        assert!(plain.inner_exceptions().is_none());
        assert!(plain.data().is_none());
        assert!(plain.describe().is_empty());
    }
}
