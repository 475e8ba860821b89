use alloc::{borrow::Cow, boxed::Box, string::String};
use core::fmt;

use crate::{
    Exception, ExceptionData,
    fields::{Fields, HELP_LINK_FIELD, RESULT_CODE_FIELD},
};

/// A general-purpose exception with the usual optional parts.
///
/// Fields rendered under `Properties:` are `HelpLink` (only when set) and
/// `HResult`.
///
/// ```
/// use faultline::{ExceptionExt, exceptions::BasicException};
///
/// let error = BasicException::new("payment declined")
///     .with_result_code(-2147467259)
///     .with_help_link("https://example.com/help/payments")
///     .with_origin("billing")
///     .with_data("order", "1042");
///
/// let text = error.format_to_string();
/// assert!(text.contains("   HelpLink: https://example.com/help/payments\n"));
/// assert!(text.contains("   HResult: 0x80004005\n"));
/// assert!(text.contains("\nSource: billing\nException Data:\n   order - 1042"));
/// ```
#[derive(Debug)]
pub struct BasicException {
    message: Cow<'static, str>,
    result_code: i32,
    help_link: Option<String>,
    origin: Option<String>,
    data: ExceptionData,
    stack_trace: Option<String>,
    inner: Option<Box<dyn Exception>>,
}

impl BasicException {
    /// Creates an exception with the given message and result code `0`.
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            result_code: 0,
            help_link: None,
            origin: None,
            data: ExceptionData::default(),
            stack_trace: None,
            inner: None,
        }
    }

    /// Sets the numeric result code, rendered as `HResult`.
    #[must_use]
    pub fn with_result_code(mut self, result_code: i32) -> Self {
        self.result_code = result_code;
        self
    }

    /// Sets the link to further documentation, rendered as `HelpLink`.
    #[must_use]
    pub fn with_help_link(mut self, help_link: impl Into<String>) -> Self {
        self.help_link = Some(help_link.into());
        self
    }

    /// Sets the component the error originated from.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Adds one entry of side data. A repeated key replaces the earlier
    /// value but keeps its position.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Sets the stack trace text.
    #[must_use]
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Fills the stack trace from the current call stack.
    #[cfg(feature = "backtrace")]
    #[must_use]
    #[inline(never)]
    pub fn with_captured_stack_trace(self) -> Self {
        let stack_trace = capture_stack_trace();
        self.with_stack_trace(stack_trace)
    }

    /// Sets the error that caused this one.
    #[must_use]
    pub fn with_inner(self, inner: impl Exception) -> Self {
        self.with_boxed_inner(Box::new(inner))
    }

    /// Sets the error that caused this one from a boxed trait object.
    #[must_use]
    pub fn with_boxed_inner(mut self, inner: Box<dyn Exception>) -> Self {
        self.inner = Some(inner);
        self
    }

    /// The numeric result code.
    #[must_use]
    pub fn result_code(&self) -> i32 {
        self.result_code
    }

    /// The help link, if any.
    #[must_use]
    pub fn help_link(&self) -> Option<&str> {
        self.help_link.as_deref()
    }
}

impl Exception for BasicException {
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.message)
    }

    fn describe(&self) -> Fields {
        Fields::new()
            .field(HELP_LINK_FIELD, |e: &Self| e.help_link.clone())
            .field(RESULT_CODE_FIELD, |e: &Self| e.result_code)
    }

    fn inner_exception(&self) -> Option<&dyn Exception> {
        self.inner.as_deref()
    }

    fn origin(&self) -> Option<Cow<'_, str>> {
        self.origin.as_deref().map(Cow::Borrowed)
    }

    fn data(&self) -> Option<&ExceptionData> {
        Some(&self.data)
    }

    fn stack_trace(&self) -> Option<Cow<'_, str>> {
        self.stack_trace.as_deref().map(Cow::Borrowed)
    }
}

impl fmt::Display for BasicException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for BasicException {}

#[cfg(feature = "backtrace")]
#[inline(never)]
fn capture_stack_trace() -> String {
    use alloc::vec::Vec;
    use core::fmt::Write as _;

    let mut frames: Vec<String> = Vec::new();
    backtrace::trace(|frame| {
        backtrace::resolve_frame(frame, |symbol| {
            let Some(name) = symbol.name() else {
                return;
            };
            let mut line = alloc::format!("   at {name:#}");
            if let (Some(file), Some(number)) = (symbol.filename(), symbol.lineno()) {
                let _ = write!(line, " in {}:line {number}", file.display());
            }
            frames.push(line);
        });
        true
    });

    // Frames up to and including the capture itself are skipped. When the
    // marker frame cannot be resolved, the whole stack is kept.
    let start = frames
        .iter()
        .position(|frame| frame.contains("with_captured_stack_trace"))
        .map_or(0, |position| position + 1);
    frames[start..].join("\n")
}
