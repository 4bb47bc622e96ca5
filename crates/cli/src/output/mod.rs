//! Output formatting
//!
//! Human-readable output is styled with `console`; `--json` switches every
//! command to machine-readable JSON on stdout.

mod formatter;

pub use formatter::Formatter;

/// Output settings shared by every command
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Emit JSON instead of human-readable text
    pub json: bool,
    /// Disable colors
    pub no_color: bool,
    /// Suppress non-error output
    pub quiet: bool,
}
