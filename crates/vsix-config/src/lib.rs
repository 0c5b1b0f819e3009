//! Configuration parsing for vsix-fetch
//!
//! This crate handles `vsix.toml` parsing, layering of global, project,
//! environment and command line settings, and extension list files.

pub mod list;
pub mod merge;
pub mod settings;
pub mod toml;

// Re-export main types
pub use crate::list::{combine, parse_list, read_list_file};
pub use crate::merge::{ConfigLayering, ConfigLoader, ConfigSource, CONFIG_FILE_NAME};
pub use crate::settings::{CompanionConfig, InstallerCommands, VsixConfig};
pub use crate::toml::VsixToml;

use vsix_core::error::VsixError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, VsixError>;
