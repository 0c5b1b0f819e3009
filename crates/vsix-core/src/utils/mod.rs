//! Utility functions and helpers.

pub mod path;

pub use path::{artifact_file_name, create_download_dir, download_dir_name};
