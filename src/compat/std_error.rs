//! Rendering of [`core::error::Error`] values.
//!
//! Standard errors only expose a message and a chain of sources. The chain
//! is copied when the error is wrapped, so each source is rendered as an
//! [`ErrorSource`] holding its message.

use alloc::{borrow::Cow, boxed::Box, string::{String, ToString}, vec::Vec};
use core::{error::Error, fmt};

use crate::{Exception, FormatOptions};

/// A snapshot of one error in a [`source`](Error::source) chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorSource {
    message: String,
    next: Option<Box<ErrorSource>>,
}

impl ErrorSource {
    /// Copies the chain starting at `source`.
    ///
    /// At most [`FormatOptions::DEFAULT`]`.max_depth` errors are copied.
    #[must_use]
    pub fn chain(source: Option<&(dyn Error + 'static)>) -> Option<Box<ErrorSource>> {
        let messages: Vec<String> = core::iter::successors(source, |&error| error.source())
            .take(FormatOptions::DEFAULT.max_depth)
            .map(ToString::to_string)
            .collect();
        messages.into_iter().rev().fold(None, |next, message| {
            Some(Box::new(ErrorSource { message, next }))
        })
    }

    /// The message of this source.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The next source in the chain.
    #[must_use]
    pub fn next(&self) -> Option<&ErrorSource> {
        self.next.as_deref()
    }
}

impl Exception for ErrorSource {
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.message)
    }

    fn inner_exception(&self) -> Option<&dyn Exception> {
        self.next.as_deref().map(|next| next as &dyn Exception)
    }
}

/// Any standard error, made renderable.
///
/// ```
/// use faultline::{ExceptionExt, compat::StdException};
///
/// let error = "12a".parse::<u32>().unwrap_err();
/// let text = StdException::new(error).format_to_string();
/// assert!(text.starts_with("Type: core::num::error::ParseIntError\n"));
/// assert!(text.contains("Message: invalid digit found in string\n"));
/// ```
pub struct StdException<E> {
    error: E,
    sources: Option<Box<ErrorSource>>,
}

impl<E> StdException<E>
where
    E: Error + Send + Sync + 'static,
{
    /// Wraps `error`, copying its source chain.
    pub fn new(error: E) -> Self {
        let sources = ErrorSource::chain(error.source());
        Self { error, sources }
    }

    /// The wrapped error.
    pub fn get_ref(&self) -> &E {
        &self.error
    }

    /// Unwraps the error.
    pub fn into_inner(self) -> E {
        self.error
    }
}

impl<E> Exception for StdException<E>
where
    E: Error + Send + Sync + 'static,
{
    fn message(&self) -> Cow<'_, str> {
        Cow::Owned(self.error.to_string())
    }

    fn type_name(&self) -> Cow<'static, str> {
        Cow::Borrowed(core::any::type_name::<E>())
    }

    fn inner_exception(&self) -> Option<&dyn Exception> {
        self.sources.as_deref().map(|source| source as &dyn Exception)
    }
}

impl<E: fmt::Debug> fmt::Debug for StdException<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.error, f)
    }
}

impl<E: fmt::Display> fmt::Display for StdException<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<E> From<E> for StdException<E>
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}
