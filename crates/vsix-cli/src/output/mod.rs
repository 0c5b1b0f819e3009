//! Terminal output for progress and results.
//!
//! Diagnostics go through `tracing` to stderr; this handler prints the
//! user-facing lines to stdout.

pub mod colors;
pub mod errors;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: colors::ColorSupport,
}

impl OutputHandler {
    /// Handler styled for the current terminal
    pub fn new() -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
        }
    }

    /// Handler that never prints escape codes
    pub fn plain() -> Self {
        Self {
            colors: colors::ColorSupport::disabled(),
        }
    }

    /// Print a dimmed informational line
    pub fn info(&self, message: &str) {
        println!("{}", self.colors.dim(message));
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        println!("{} {}", self.colors.green("✓"), message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        println!("{} {}", self.colors.yellow("⚠"), message);
    }

    /// Print a step message with a leading marker
    pub fn step(&self, marker: &str, message: &str) {
        println!("{} {}", marker, self.colors.bold(message));
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
