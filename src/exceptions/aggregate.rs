use alloc::{borrow::Cow, vec::Vec};
use core::fmt;

use triomphe::Arc;
use unsize::CoerceUnsize;

use crate::Exception;

/// Several errors that occurred independently of each other.
///
/// Each cause is rendered as `InnerExceptions[<index>]:` in insertion order.
/// The first cause is also exposed as [`inner_exception`], so code that only
/// follows single causes still finds one, but it is never rendered twice.
///
/// Causes are reference counted, so the same error can be part of several
/// aggregates.
///
/// [`inner_exception`]: Exception::inner_exception
///
/// ```
/// use faultline::{
///     ExceptionExt,
///     exceptions::{AggregateException, BasicException},
/// };
///
/// let error = AggregateException::new()
///     .with_cause(BasicException::new("replica 1 unreachable"))
///     .with_cause(BasicException::new("replica 2 unreachable"));
///
/// let text = error.format_to_string();
/// assert!(text.contains("InnerExceptions[0]:\n   Type: "));
/// assert!(text.contains("InnerExceptions[1]:\n   Type: "));
/// assert!(!text.contains("InnerException:"));
/// ```
#[derive(Debug)]
pub struct AggregateException {
    message: Cow<'static, str>,
    causes: Vec<Arc<dyn Exception>>,
}

impl AggregateException {
    /// The message used by [`AggregateException::new`].
    pub const DEFAULT_MESSAGE: &'static str = "One or more errors occurred.";

    /// Creates an aggregate without causes and with the default message.
    #[must_use]
    pub fn new() -> Self {
        Self::with_message(Self::DEFAULT_MESSAGE)
    }

    /// Creates an aggregate without causes.
    pub fn with_message(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// Appends a cause.
    #[must_use]
    pub fn with_cause(self, cause: impl Exception) -> Self {
        self.with_shared_cause(share(cause))
    }

    /// Appends a cause that may also be referenced elsewhere.
    #[must_use]
    pub fn with_shared_cause(mut self, cause: Arc<dyn Exception>) -> Self {
        self.causes.push(cause);
        self
    }

    /// The causes, in insertion order.
    #[must_use]
    pub fn causes(&self) -> &[Arc<dyn Exception>] {
        &self.causes
    }
}

impl Default for AggregateException {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Exception> FromIterator<E> for AggregateException {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::with_cause)
    }
}

/// Moves `exception` into a reference-counted trait object.
pub fn share(exception: impl Exception) -> Arc<dyn Exception> {
    Arc::new(exception).unsize(unsize::Coercion!(to dyn Exception))
}

impl Exception for AggregateException {
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.message)
    }

    fn inner_exception(&self) -> Option<&dyn Exception> {
        self.causes.first().map(|cause| &**cause)
    }

    fn inner_exceptions(&self) -> Option<Vec<&dyn Exception>> {
        Some(self.causes.iter().map(|cause| &**cause).collect())
    }
}

impl fmt::Display for AggregateException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for AggregateException {}
