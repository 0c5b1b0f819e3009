//! ANSI styling that respects NO_COLOR and TTY detection.

use std::env;
use std::io::{self, IsTerminal};

const RED: &str = "31";
const GREEN: &str = "32";
const YELLOW: &str = "33";
const BOLD: &str = "1";
const DIM: &str = "2";

/// Whether ANSI escape codes are written
#[derive(Debug, Clone, Copy)]
pub struct ColorSupport {
    enabled: bool,
}

impl ColorSupport {
    /// Enable colors unless NO_COLOR is set or output is not a terminal
    pub fn detect() -> Self {
        Self {
            enabled: env::var_os("NO_COLOR").is_none()
                && io::stderr().is_terminal()
                && io::stdout().is_terminal(),
        }
    }

    /// Never emit escape codes
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    /// Success text
    pub fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    /// Warning text
    pub fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    /// Error text
    pub fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    /// Emphasized text
    pub fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    /// Secondary text
    pub fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }
}
