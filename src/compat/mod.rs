//! Rendering of errors from the wider Rust ecosystem.
//!
//! - [`StdException`] renders any [`core::error::Error`], with its
//!   [`source`](core::error::Error::source) chain as nested causes.
//! - [`anyhow1`] renders [`anyhow::Error`] values (requires the
//!   `compat-anyhow1` feature flag).
//!
//! The [`IntoException`] trait converts a standard error in method-call
//! position:
//!
//! ```
//! use faultline::{ExceptionExt, compat::IntoException};
//!
//! let error = "x".parse::<i32>().unwrap_err().into_exception();
//! assert!(error.format_to_string().contains("Message: invalid digit found in string"));
//! ```

#[cfg(feature = "compat-anyhow1")]
#[cfg_attr(docsrs, doc(cfg(feature = "compat-anyhow1")))]
pub mod anyhow1;
mod std_error;

pub use self::std_error::{ErrorSource, StdException};
use crate::Exception;

/// Conversion of a foreign error into an [`Exception`].
pub trait IntoException {
    /// The renderable form.
    type Exception: Exception;

    /// Performs the conversion.
    fn into_exception(self) -> Self::Exception;
}

impl<E> IntoException for E
where
    E: core::error::Error + Send + Sync + 'static,
{
    type Exception = StdException<E>;

    fn into_exception(self) -> Self::Exception {
        StdException::new(self)
    }
}
