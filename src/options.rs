/// Layout settings for a rendered report.
///
/// # Examples
///
/// ```
/// use faultline::{FormatOptions, Renderer};
///
/// let options = FormatOptions {
///     indent: "  ",
///     ..FormatOptions::DEFAULT
/// };
/// let renderer = Renderer::global().with_options(options);
/// # let _ = renderer;
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FormatOptions {
    /// The prefix added for each nesting level.
    pub indent: &'static str,
    /// The deepest cause that is still rendered.
    ///
    /// Causes nested deeper than this are replaced by a single marker line,
    /// which also bounds the output for cause graphs that contain cycles.
    pub max_depth: usize,
}

impl FormatOptions {
    /// Three-space indentation and a nesting limit of 64.
    pub const DEFAULT: Self = Self {
        indent: "   ",
        max_depth: 64,
    };
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}
