//! Rendering of [`anyhow::Error`] values.
//!
//! Requires the `compat-anyhow1` feature.
//!
//! An [`anyhow::Error`] is rendered with its outermost context as the
//! message and every further entry of its [`chain`](anyhow::Error::chain) as
//! a nested `InnerException:`.
//!
//! ```
//! use anyhow::Context;
//! use faultline::{ExceptionExt, compat::anyhow1::AnyhowException};
//!
//! let error = Err::<(), _>(anyhow::anyhow!("connection refused"))
//!     .context("could not reach the database")
//!     .unwrap_err();
//!
//! let text = AnyhowException::from(error).format_to_string();
//! assert!(text.starts_with("Type: anyhow::Error\nMessage: could not reach the database\n"));
//! assert!(text.contains("\nInnerException:\n   Type: "));
//! assert!(text.ends_with("   Message: connection refused\n   Properties:"));
//! ```

use alloc::{borrow::Cow, boxed::Box, string::ToString};
use core::fmt;

use super::ErrorSource;
use crate::Exception;

/// An [`anyhow::Error`], made renderable.
pub struct AnyhowException {
    error: anyhow::Error,
    sources: Option<Box<ErrorSource>>,
}

impl AnyhowException {
    /// Wraps `error`, copying its chain.
    #[must_use]
    pub fn new(error: anyhow::Error) -> Self {
        let sources = ErrorSource::chain(error.source());
        Self { error, sources }
    }

    /// The wrapped error.
    #[must_use]
    pub fn get_ref(&self) -> &anyhow::Error {
        &self.error
    }

    /// Unwraps the error.
    #[must_use]
    pub fn into_inner(self) -> anyhow::Error {
        self.error
    }
}

impl Exception for AnyhowException {
    fn message(&self) -> Cow<'_, str> {
        Cow::Owned(self.error.to_string())
    }

    fn type_name(&self) -> Cow<'static, str> {
        Cow::Borrowed("anyhow::Error")
    }

    fn inner_exception(&self) -> Option<&dyn Exception> {
        self.sources.as_deref().map(|source| source as &dyn Exception)
    }
}

impl From<anyhow::Error> for AnyhowException {
    fn from(error: anyhow::Error) -> Self {
        Self::new(error)
    }
}

impl fmt::Debug for AnyhowException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.error, f)
    }
}

impl fmt::Display for AnyhowException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn test_chain_copied() {
        let error = Err::<(), _>(anyhow::anyhow!("root"))
            .context("middle")
            .context("top")
            .unwrap_err();
        let exception = AnyhowException::new(error);
        assert_eq!(exception.message(), "top");
        let middle = exception.inner_exception().unwrap();
        assert_eq!(middle.message(), "middle");
        assert_eq!(middle.inner_exception().unwrap().message(), "root");
        assert_eq!(exception.to_string(), "top");
    }

    #[test]
    fn test_single_error_has_no_cause() {
        let exception = AnyhowException::from(anyhow::anyhow!("alone"));
        assert!(exception.inner_exception().is_none());
    }
}
