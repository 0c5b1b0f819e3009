//! Command implementation.
//!
//! `vsix` has a single command: fetch the queued extensions. The flags map
//! onto a configuration layer that sits on top of files and environment.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use std::collections::HashMap;
use vsix_core::error::{VsixError, VsixResult};

pub mod fetch;


use crate::output::OutputHandler;

/// Flags describing what to fetch and how
#[derive(Args, Debug, Default, Clone)]
pub struct FetchArgs {
    /// Extensions to install (<publisher>.<extension>@<version>)
    #[arg(value_name = "EXTENSION")]
    pub identifiers: Vec<String>,

    /// Extension list, one identifier per line
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<Utf8PathBuf>,

    /// Install to VS Code Insiders rather than VS Code
    #[arg(short, long)]
    pub insiders: bool,

    /// Download extensions but do not install them
    #[arg(long)]
    pub download_only: bool,

    /// Upstream to download from (local, marketplace, publisher-asset)
    #[arg(long, value_name = "NAME")]
    pub upstream: Option<String>,

    /// Directory in which the per-run download directory is created
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<Utf8PathBuf>,

    /// Configuration file to use instead of searching for vsix.toml
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Print the download URLs without fetching anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Shared context for the command
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    /// Directory holding the global config; `None` disables it
    pub global_dir: Option<Utf8PathBuf>,
    pub env: HashMap<String, String>,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Build the context from the process environment
    pub fn new() -> VsixResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| VsixError::io("Failed to get current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|path| VsixError::ConfigValidation {
            field: "cwd".to_string(),
            reason: format!("{} is not valid UTF-8", path.display()),
        })?;

        let global_dir = vsix_config::ConfigLoader::new(cwd.clone())
            .global_dir()
            .map(Utf8Path::to_path_buf);

        Ok(Self {
            cwd,
            global_dir,
            env: vsix_config::ConfigLayering::collect_env_overrides(),
            output: OutputHandler::new(),
        })
    }

    /// Resolve `path` against the working directory
    pub fn absolute(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

/// Run the fetch described by `args`
pub async fn execute(args: FetchArgs, ctx: &CommandContext) -> VsixResult<()> {
    fetch::execute(args, ctx).await.map(|_| ())
}
