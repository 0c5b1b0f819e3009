use camino::Utf8PathBuf;
use vsix_core::PackageIdentifier;

use crate::process::InstallOutcome;

/// One queue item that was fetched and passed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedItem {
    pub identifier: PackageIdentifier,
    pub artifact: Utf8PathBuf,
    pub bytes: u64,
    /// `None` in download-only mode
    pub install: Option<InstallOutcome>,
}

/// Server bundle downloaded for a companion trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionBundle {
    pub version: String,
    pub commit: String,
    pub path: Utf8PathBuf,
}

/// Summary of a run that drained its queue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// `None` when the queue was empty and nothing was created
    pub download_dir: Option<Utf8PathBuf>,
    pub completed: Vec<CompletedItem>,
    pub companion_bundles: Vec<CompanionBundle>,
    /// Rate limit retries spent over the whole run
    pub rate_limit_retries: u32,
}

impl RunReport {
    /// Items whose installer run failed
    pub fn failed_installs(&self) -> impl Iterator<Item = &CompletedItem> {
        self.completed
            .iter()
            .filter(|item| matches!(&item.install, Some(outcome) if !outcome.is_installed()))
    }

    /// Bytes downloaded across all items
    pub fn total_bytes(&self) -> u64 {
        self.completed.iter().map(|item| item.bytes).sum()
    }
}
