//! VS Code release channels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which VS Code build receives the installed extensions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Stable,
    Insiders,
}

impl Channel {
    /// Build quality name used by the VS Code update service
    pub fn quality(&self) -> &'static str {
        match self {
            Channel::Stable => "stable",
            Channel::Insiders => "insider",
        }
    }

    pub fn from_insiders_flag(insiders: bool) -> Self {
        if insiders {
            Channel::Insiders
        } else {
            Channel::Stable
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Stable => f.write_str("stable"),
            Channel::Insiders => f.write_str("insiders"),
        }
    }
}
