//! Turning an exception into text.
//!
//! A report lists, in this order: the type, the message, the declared fields,
//! validation failures, the source, side data, the stack trace, and finally
//! the causes, each rendered recursively one indentation level deeper.
//!
//! ```
//! use faultline::{exceptions::BasicException, format_to_string};
//!
//! let error = BasicException::new("could not save the order")
//!     .with_result_code(5)
//!     .with_inner(BasicException::new("disk full"));
//!
//! let text = format_to_string(&error);
//! assert_eq!(
//!     text,
//!     "Type: faultline::exceptions::basic::BasicException\n\
//!      Message: could not save the order\n\
//!      Properties:\n   \
//!         HResult: 0x00000005\n\
//!      InnerException:\n   \
//!         Type: faultline::exceptions::basic::BasicException\n   \
//!         Message: disk full\n   \
//!         Properties:\n      \
//!            HResult: 0x00000000"
//! );
//! ```

use alloc::{
    borrow::{Cow, ToOwned},
    boxed::Box,
    string::String,
    vec::Vec,
};
use core::{
    any::Any,
    fmt::{self, Write as _},
};

use crate::{
    Exception,
    exception::concrete_type_id,
    fields::{FieldError, FieldValue, Fields, RawField},
    options::FormatOptions,
    registry::{Registry, SKIPPED_FIELDS},
    validation::{ValidationAdapter, ValidationEvent},
};

/// The cached, per-type part of rendering: the type's field list.
///
/// Obtained from [`Registry::get_or_build`].
pub struct RenderFunction {
    fields: Vec<RawField>,
}

impl RenderFunction {
    pub(crate) fn build(exception: &dyn Exception) -> Self {
        let type_name = Self::safe_type_name(exception);
        let declared = catch_panic(move || exception.describe()).unwrap_or_else(|_| {
            tracing::debug!(
                exception_type = %type_name,
                "describe panicked, rendering without fields"
            );
            Fields::empty()
        });

        let target = concrete_type_id(exception);
        let mut fields = Vec::with_capacity(declared.len());
        for field in declared.into_vec() {
            if SKIPPED_FIELDS.contains(&field.name()) {
                tracing::debug!(
                    exception_type = %type_name,
                    field = field.name(),
                    "field has a dedicated section, dropping it from the properties"
                );
            } else if field.target() != target {
                tracing::debug!(
                    exception_type = %type_name,
                    field = field.name(),
                    "field reads from a different type, dropping it"
                );
            } else {
                fields.push(field);
            }
        }

        tracing::trace!(
            exception_type = %type_name,
            fields = fields.len(),
            "built render function"
        );
        Self { fields }
    }

    pub(crate) fn without_fields() -> Self {
        Self { fields: Vec::new() }
    }

    /// The type name, or the panic message if `type_name` panics.
    pub(crate) fn safe_type_name(exception: &dyn Exception) -> Cow<'static, str> {
        catch_panic(move || exception.type_name())
            .unwrap_or_else(|payload| Cow::Owned(panic_text(&*payload)))
    }

    /// The names of the rendered fields, in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(RawField::name)
    }

    fn render(&self, exception: &dyn Exception, writer: &mut Writer<'_>) {
        let target: &dyn Any = exception;

        writer.line(format_args!("Type: {}", Self::safe_type_name(exception)));

        let message = catch_panic(move || exception.message())
            .unwrap_or_else(|payload| Cow::Owned(panic_text(&*payload)));
        writer.labeled("Message", message.trim());

        writer.line(format_args!("Properties:"));
        writer.indented(|writer| {
            for field in &self.fields {
                let text = match read_field(field, target) {
                    Ok(value) if field.omit_when_absent() && value.is_absent() => continue,
                    Ok(value) => field.format().render(&value),
                    Err(error) => error.message().trim().to_owned(),
                };
                writer.labeled(field.name(), &text);
            }
        });

        if let Some(adapter) = writer.renderer.validation
            && adapter.matches(exception)
        {
            writer.indented(|writer| {
                writer.line(format_args!("EntityValidationErrors:"));
                writer.indented(|writer| writer.validation_errors(adapter, target));
            });
        }

        match catch_panic(move || exception.origin()) {
            Ok(Some(origin)) if !origin.is_empty() => {
                writer.line(format_args!("Source: {origin}"));
            }
            Ok(_) => {}
            Err(payload) => writer.line(format_args!("Source: {}", panic_text(&*payload))),
        }

        match catch_panic(move || exception.data()) {
            Ok(Some(data)) if !data.is_empty() => {
                writer.line(format_args!("Exception Data:"));
                writer.indented(|writer| {
                    for (key, value) in data {
                        writer.line(format_args!("{key} - {value}"));
                    }
                });
            }
            Ok(_) => {}
            Err(payload) => writer.failed_section("Exception Data", &*payload),
        }

        match catch_panic(move || exception.stack_trace()) {
            Ok(Some(stack_trace)) => {
                writer.line(format_args!("Stack Trace:"));
                writer.lines(&stack_trace);
            }
            Ok(None) => {}
            Err(payload) => writer.failed_section("Stack Trace", &*payload),
        }

        match catch_panic(move || exception.inner_exceptions()) {
            Ok(Some(causes)) => {
                for (index, cause) in causes.into_iter().enumerate() {
                    writer.line(format_args!("InnerExceptions[{index}]:"));
                    writer.nested(cause);
                }
            }
            Ok(None) => match catch_panic(move || exception.inner_exception()) {
                Ok(Some(cause)) => {
                    writer.line(format_args!("InnerException:"));
                    writer.nested(cause);
                }
                Ok(None) => {}
                Err(payload) => writer.failed_section("InnerException", &*payload),
            },
            Err(payload) => writer.failed_section("InnerExceptions", &*payload),
        }
    }
}

impl fmt::Debug for RenderFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.field_names()).finish()
    }
}

fn read_field(field: &RawField, target: &dyn Any) -> Result<FieldValue, FieldError> {
    catch_panic(|| field.read(target)).unwrap_or_else(|payload| Err(FieldError::from_panic(&*payload)))
}

/// The trimmed message of a caught panic.
fn panic_text(payload: &(dyn Any + Send)) -> String {
    let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        ""
    };
    match message.trim() {
        "" => "accessor panicked".to_owned(),
        message => message.to_owned(),
    }
}

#[cfg(feature = "std")]
fn catch_panic<R>(f: impl FnOnce() -> R) -> Result<R, Box<dyn Any + Send>> {
    std::panic::catch_unwind(core::panic::AssertUnwindSafe(f))
}

#[cfg(not(feature = "std"))]
fn catch_panic<R>(f: impl FnOnce() -> R) -> Result<R, Box<dyn Any + Send>> {
    Ok(f())
}

/// The mutable state of one rendering pass.
struct Writer<'r> {
    renderer: &'r Renderer<'r>,
    output: String,
    line_prefix: String,
    scratch: String,
    depth: usize,
}

impl<'r> Writer<'r> {
    fn new(renderer: &'r Renderer<'r>) -> Self {
        Self {
            renderer,
            output: String::new(),
            line_prefix: String::new(),
            scratch: String::new(),
            depth: 0,
        }
    }

    fn exception(&mut self, exception: &dyn Exception) {
        let function = self.renderer.registry.get_or_build(exception);
        function.render(exception, self);
    }

    /// Writes formatted text, prefixing each of its lines.
    fn line(&mut self, args: fmt::Arguments<'_>) {
        if let Some(text) = args.as_str() {
            self.lines(text);
            return;
        }
        let mut scratch = core::mem::take(&mut self.scratch);
        scratch.clear();
        // Writing into a String cannot fail.
        let _ = scratch.write_fmt(args);
        self.lines(&scratch);
        self.scratch = scratch;
    }

    fn lines(&mut self, text: &str) {
        for line in text.lines() {
            self.output.push_str(&self.line_prefix);
            self.output.push_str(line);
            self.output.push('\n');
        }
    }

    /// Writes `label: value` on one line, or the label as a header with the
    /// value indented below it when the value spans several lines.
    fn labeled(&mut self, label: &str, value: &str) {
        if value.contains('\n') {
            self.line(format_args!("{label}:"));
            self.indented(|writer| writer.lines(value));
        } else {
            self.line(format_args!("{label}: {value}"));
        }
    }

    fn indented<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let len_before = self.line_prefix.len();
        self.line_prefix.push_str(self.renderer.options.indent);
        let result = f(self);
        self.line_prefix.truncate(len_before);
        result
    }

    fn nested(&mut self, cause: &dyn Exception) {
        self.indented(|writer| {
            let max_depth = writer.renderer.options.max_depth;
            if writer.depth >= max_depth {
                writer.line(format_args!("[maximum nesting depth of {max_depth} reached]"));
                return;
            }

            let start = writer.output.len();
            writer.depth += 1;
            writer.exception(cause);
            writer.depth -= 1;
            writer.trim_end_from(start);
            writer.output.push('\n');
        });
    }

    fn validation_errors(&mut self, adapter: &ValidationAdapter, target: &dyn Any) {
        let indent = self.renderer.options.indent;
        let base = self.line_prefix.len();
        // Whatever was written before a failure stays; the rest is dropped.
        let _ = catch_panic(|| {
            adapter.walk(target, &mut |event| {
                self.line_prefix.truncate(base);
                match event {
                    ValidationEvent::Entity(entity_type) => {
                        self.line(format_args!("{}:", entity_type.name()));
                    }
                    ValidationEvent::Failure { property, message } => {
                        self.line_prefix.push_str(indent);
                        self.line(format_args!("{property}: {message}"));
                    }
                }
            })
        });
        self.line_prefix.truncate(base);
    }

    /// Writes a section whose accessor panicked, with the panic's message as
    /// its body.
    fn failed_section(&mut self, label: &str, payload: &(dyn Any + Send)) {
        self.line(format_args!("{label}:"));
        let text = panic_text(payload);
        self.indented(|writer| writer.lines(&text));
    }

    fn trim_end_from(&mut self, start: usize) {
        let trimmed = self.output[start..].trim_end().len();
        self.output.truncate(start + trimmed);
    }

    fn finish(mut self) -> String {
        self.trim_end_from(0);
        self.output
    }
}

/// Renders exceptions with a given registry, validation adapter and layout.
///
/// [`Renderer::global`] is what [`format`] uses. Separate renderers are
/// mostly useful for tests and for embedding reports in other layouts.
///
/// ```
/// use faultline::{FormatOptions, Registry, Renderer, exceptions::BasicException};
///
/// let registry = Registry::new();
/// let renderer = Renderer::new(&registry).with_options(FormatOptions {
///     indent: "\t",
///     ..FormatOptions::DEFAULT
/// });
/// let error = BasicException::new("outer").with_inner(BasicException::new("inner"));
/// assert!(renderer.render(&error).contains("\n\tMessage: inner\n"));
/// ```
#[derive(Copy, Clone, Debug)]
pub struct Renderer<'a> {
    registry: &'a Registry,
    validation: Option<&'a ValidationAdapter>,
    options: FormatOptions,
}

impl Renderer<'static> {
    /// The global registry, the global validation adapter and default
    /// options.
    #[must_use]
    pub fn global() -> Self {
        Self {
            registry: Registry::global(),
            validation: ValidationAdapter::global(),
            options: FormatOptions::DEFAULT,
        }
    }
}

impl<'a> Renderer<'a> {
    /// A renderer using `registry`, no validation adapter and default
    /// options.
    #[must_use]
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            validation: None,
            options: FormatOptions::DEFAULT,
        }
    }

    /// Replaces the validation adapter.
    #[must_use]
    pub fn with_validation(self, validation: Option<&'a ValidationAdapter>) -> Self {
        Self { validation, ..self }
    }

    /// Replaces the layout options.
    #[must_use]
    pub fn with_options(self, options: FormatOptions) -> Self {
        Self { options, ..self }
    }

    /// The layout options in use.
    #[must_use]
    pub fn options(&self) -> FormatOptions {
        self.options
    }

    /// Renders `exception` and all of its causes.
    ///
    /// Never fails. Trailing whitespace is removed from the result.
    #[must_use]
    pub fn render(&self, exception: &dyn Exception) -> String {
        let mut writer = Writer::new(self);
        writer.exception(exception);
        writer.finish()
    }

    /// A value that renders `exception` with this renderer when displayed.
    #[must_use]
    pub fn report(self, exception: &'a dyn Exception) -> ExceptionReport<'a> {
        ExceptionReport {
            exception,
            renderer: self,
        }
    }
}

/// Formats an optional exception; `None` stays `None`.
///
/// ```
/// assert_eq!(faultline::format(None), None);
/// ```
#[must_use]
pub fn format(exception: Option<&dyn Exception>) -> Option<String> {
    exception.map(format_to_string)
}

/// Formats an exception with the global renderer.
#[must_use]
pub fn format_to_string(exception: &dyn Exception) -> String {
    Renderer::global().render(exception)
}

/// A lazily rendered report, as returned by [`ExceptionExt::report`].
#[derive(Copy, Clone, Debug)]
pub struct ExceptionReport<'a> {
    exception: &'a dyn Exception,
    renderer: Renderer<'a>,
}

impl fmt::Display for ExceptionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.renderer.render(self.exception))
    }
}

/// Method-call access to the global renderer.
///
/// ```
/// use faultline::{ExceptionExt, exceptions::BasicException};
///
/// let error = BasicException::new("boom");
/// assert!(error.report().to_string().contains("Message: boom"));
/// assert_eq!(error.format_to_string(), error.report().to_string());
/// ```
pub trait ExceptionExt {
    /// Formats `self` with the global renderer.
    fn format_to_string(&self) -> String;

    /// A value that renders `self` when displayed.
    fn report(&self) -> ExceptionReport<'_>;
}

impl<E: Exception> ExceptionExt for E {
    fn format_to_string(&self) -> String {
        format_to_string(self)
    }

    fn report(&self) -> ExceptionReport<'_> {
        Renderer::global().report(self)
    }
}

impl<'a> ExceptionExt for dyn Exception + 'a {
    fn format_to_string(&self) -> String {
        format_to_string(self)
    }

    fn report(&self) -> ExceptionReport<'_> {
        Renderer::global().report(self)
    }
}

#[cfg(test)]
mod tests {
    use alloc::borrow::Cow;

    use super::*;
    use crate::fields::Fields;

    struct Chain {
        depth: usize,
        next: Option<Box<Chain>>,
    }

    impl Chain {
        fn of_length(length: usize) -> Self {
            let mut chain = Chain {
                depth: length - 1,
                next: None,
            };
            for depth in (0..length - 1).rev() {
                chain = Chain {
                    depth,
                    next: Some(Box::new(chain)),
                };
            }
            chain
        }
    }

    impl Exception for Chain {
        fn message(&self) -> Cow<'_, str> {
            Cow::Owned(alloc::format!("level {}", self.depth))
        }

        fn type_name(&self) -> Cow<'static, str> {
            Cow::Borrowed("Chain")
        }

        fn inner_exception(&self) -> Option<&dyn Exception> {
            self.next.as_deref().map(|next| next as &dyn Exception)
        }
    }

    struct Fragile;

    impl Exception for Fragile {
        fn message(&self) -> Cow<'_, str> {
            Cow::Borrowed("fragile")
        }

        fn type_name(&self) -> Cow<'static, str> {
            Cow::Borrowed("Fragile")
        }

        fn describe(&self) -> Fields {
            Fields::new()
                .try_field("Denied", |_: &Self| Err::<i32, _>("  access denied \n"))
                .field("Multi", |_: &Self| "first\nsecond")
                .field("Empty", |_: &Self| None::<String>)
        }
    }

    #[test]
    fn test_renderer_send_sync() {
        static_assertions::assert_impl_all!(Renderer<'static>: Send, Sync, Copy);
        static_assertions::assert_impl_all!(RenderFunction: Send, Sync);
    }

    #[test]
    fn test_field_rendering() {
        let registry = Registry::new();
        let text = Renderer::new(&registry).render(&Fragile);
        assert_eq!(
            text,
            "Type: Fragile\n\
             Message: fragile\n\
             Properties:\n   \
                Denied: access denied\n   \
                Multi:\n      \
                   first\n      \
                   second\n   \
                Empty: [null]"
        );
    }

    #[test]
    fn test_depth_cap() {
        let registry = Registry::new();
        let renderer = Renderer::new(&registry).with_options(FormatOptions {
            max_depth: 2,
            ..FormatOptions::DEFAULT
        });
        let text = renderer.render(&Chain::of_length(5));
        assert!(text.contains("      Message: level 2\n"));
        assert!(!text.contains("level 3"));
        assert!(text.ends_with("\n         [maximum nesting depth of 2 reached]"));
    }

    #[test]
    fn test_zero_depth_renders_no_causes() {
        let registry = Registry::new();
        let renderer = Renderer::new(&registry).with_options(FormatOptions {
            max_depth: 0,
            ..FormatOptions::DEFAULT
        });
        assert_eq!(
            renderer.render(&Chain::of_length(2)),
            "Type: Chain\n\
             Message: level 0\n\
             Properties:\n\
             InnerException:\n   \
                [maximum nesting depth of 0 reached]"
        );
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_panicking_field() {
        struct Panicky;

        impl Exception for Panicky {
            fn message(&self) -> Cow<'_, str> {
                Cow::Borrowed("panicky")
            }

            fn describe(&self) -> Fields {
                Fields::new()
                    .field("Before", |_: &Self| 1)
                    .field("Broken", |_: &Self| -> i32 { panic!("field exploded") })
                    .field("After", |_: &Self| 2)
            }
        }

        let registry = Registry::new();
        let text = Renderer::new(&registry).render(&Panicky);
        assert!(text.ends_with("   Before: 1\n   Broken: field exploded\n   After: 2"));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_panicking_describe() {
        struct NoFields;

        impl Exception for NoFields {
            fn message(&self) -> Cow<'_, str> {
                Cow::Borrowed("no fields")
            }

            fn type_name(&self) -> Cow<'static, str> {
                Cow::Borrowed("NoFields")
            }

            fn describe(&self) -> Fields {
                panic!("describe exploded")
            }
        }

        let registry = Registry::new();
        let renderer = Renderer::new(&registry);
        let expected = "Type: NoFields\nMessage: no fields\nProperties:";
        assert_eq!(renderer.render(&NoFields), expected);
        assert_eq!(registry.get_or_build(&NoFields).field_names().count(), 0);
        assert_eq!(renderer.render(&NoFields), expected);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_panicking_accessors() {
        struct Hostile;

        impl Exception for Hostile {
            fn message(&self) -> Cow<'_, str> {
                panic!("no message")
            }

            fn type_name(&self) -> Cow<'static, str> {
                panic!("no type name")
            }

            fn origin(&self) -> Option<Cow<'_, str>> {
                panic!("no origin")
            }

            fn data(&self) -> Option<&crate::ExceptionData> {
                panic!("no data")
            }

            fn stack_trace(&self) -> Option<Cow<'_, str>> {
                std::panic::panic_any(7_u8)
            }

            fn inner_exception(&self) -> Option<&dyn Exception> {
                panic!("no cause\n")
            }

            fn describe(&self) -> Fields {
                Fields::new().field("Kept", |_: &Self| 1)
            }
        }

        let registry = Registry::new();
        assert_eq!(
            Renderer::new(&registry).render(&Hostile),
            "Type: no type name\n\
             Message: no message\n\
             Properties:\n   \
                Kept: 1\n\
             Source: no origin\n\
             Exception Data:\n   \
                no data\n\
             Stack Trace:\n   \
                accessor panicked\n\
             InnerException:\n   \
                no cause"
        );
    }
}
