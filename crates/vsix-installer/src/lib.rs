//! # vsix-installer
//!
//! Drives a list of extension identifiers through download, installation and
//! rate limit recovery.
//!
//! - `queue`: ordered work with a cursor and retry budget
//! - `engine`: the fetch-and-recover state machine
//! - `fetcher`: HTTP seam, implemented by `vsix_registry::VsixClient`
//! - `process`: external installer invocation
//! - `companion`: VS Code server bundle for remote development

pub mod companion;
pub mod engine;
pub mod fetcher;
pub mod process;
pub mod queue;

// Re-export main types
pub use companion::CodeVersion;
pub use engine::{CompanionBundle, CompletedItem, Engine, FetchSettings, PlannedFetch, RunReport};
pub use fetcher::ArtifactFetcher;
pub use process::{CodeInstaller, InstallOutcome, Installer};
pub use queue::{WorkQueue, MAX_RATE_LIMIT_RETRIES};
