//! Path utilities for the per-run download directory.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local};
use std::path::{Component, Path};

use crate::error::{VsixError, VsixResult};

/// Directory name for a run started at `started`, e.g. `vsix-20240131-094502`
pub fn download_dir_name(started: &DateTime<Local>) -> String {
    format!("vsix-{}", started.format("%Y%m%d-%H%M%S"))
}

/// Create the per-run download directory under `base`.
///
/// An existing directory with the same name is reused.
pub fn create_download_dir(base: &Utf8Path, started: &DateTime<Local>) -> VsixResult<Utf8PathBuf> {
    let dir = base.join(download_dir_name(started));
    std::fs::create_dir_all(&dir)
        .map_err(|e| VsixError::io(format!("Failed to create download directory {}", dir), e))?;
    Ok(dir)
}

/// File name for a downloaded artifact.
///
/// `stem` must be a single plain path component.
pub fn artifact_file_name(stem: &str, extension: &str) -> VsixResult<String> {
    let name = format!("{}.{}", stem, extension);
    let mut components = Path::new(&name).components();

    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !stem.is_empty() => Ok(name),
        _ => Err(VsixError::ConfigValidation {
            field: "artifact".to_string(),
            reason: format!("'{}' is not a plain file name", name),
        }),
    }
}
