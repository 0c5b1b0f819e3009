//! Error message formatting with actionable suggestions.
//!
//! Prints the error, a `help:` line when one applies, the config file
//! location for TOML errors and the `caused by` chain.

use super::colors::ColorSupport;
use std::error::Error;
use vsix_core::error::VsixError;

/// Renders a `VsixError` for the terminal
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    /// Formatter styled for the current terminal
    pub fn new() -> Self {
        Self::with_colors(ColorSupport::detect())
    }

    /// Formatter using the given color support
    pub fn with_colors(colors: ColorSupport) -> Self {
        Self { colors }
    }

    /// Format an error with context and suggestions
    pub fn format_error(&self, error: &VsixError) -> String {
        let mut output = format!("{}: {}\n", self.colors.red("error"), error);

        if let VsixError::TomlParse {
            file, line, column, ..
        } = error
        {
            output.push_str(&self.format_location(file, *line, *column));
            output.push('\n');
        }

        if let Some(suggestion) = error.suggestion() {
            output.push('\n');
            output.push_str(&format!("{}: {}\n", self.colors.dim("help"), suggestion));
        }

        let mut source = error.source();
        while let Some(err) = source {
            output.push('\n');
            output.push_str(&format!("{}: {}", self.colors.dim("caused by"), err));
            source = err.source();
        }

        output
    }

    fn format_location(&self, file: &str, line: usize, column: usize) -> String {
        format!("{} {}:{}:{}", self.colors.dim("-->"), file, line, column)
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}
