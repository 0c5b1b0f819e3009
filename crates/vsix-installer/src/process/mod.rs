//! External installer invocation
//!
//! The installer is a black box: it gets the artifact path and its exit code
//! is only logged. The version query is the one call whose output matters.

use camino::Utf8Path;
use std::future::Future;
use tokio::process::Command;
use tracing::{debug, info};
use vsix_config::InstallerCommands;
use vsix_core::error::{VsixError, VsixResult};
use vsix_core::Channel;

use crate::companion::{parse_version_output, CodeVersion};

/// What happened when the installer ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    /// Non-zero exit (`code` is `None` when killed by a signal) or spawn failure
    Failed { code: Option<i32>, message: String },
}

impl InstallOutcome {
    /// True when the installer exited successfully
    pub fn is_installed(&self) -> bool {
        matches!(self, InstallOutcome::Installed)
    }
}

/// Installs downloaded artifacts into an editor
pub trait Installer {
    /// Install `artifact` into the editor for `channel`. Never fails the run.
    fn install(
        &self,
        artifact: &Utf8Path,
        channel: Channel,
    ) -> impl Future<Output = InstallOutcome> + Send;

    /// Ask the editor for its release and commit
    fn version_info(
        &self,
        channel: Channel,
    ) -> impl Future<Output = VsixResult<CodeVersion>> + Send;
}

/// Runs `code` / `code-insiders` (or configured replacements)
#[derive(Debug, Clone, Default)]
pub struct CodeInstaller {
    commands: InstallerCommands,
}

impl CodeInstaller {
    pub fn new(commands: InstallerCommands) -> Self {
        Self { commands }
    }

    pub fn command(&self, channel: Channel) -> &str {
        self.commands.for_channel(channel)
    }
}

impl Installer for CodeInstaller {
    async fn install(&self, artifact: &Utf8Path, channel: Channel) -> InstallOutcome {
        let command = self.command(channel);
        info!("Installing {} using {}", artifact, command);

        match Command::new(command)
            .arg("--install-extension")
            .arg(artifact.as_str())
            .status()
            .await
        {
            Ok(status) if status.success() => InstallOutcome::Installed,
            Ok(status) => InstallOutcome::Failed {
                code: status.code(),
                message: format!("{} exited with {}", command, status),
            },
            Err(e) => InstallOutcome::Failed {
                code: None,
                message: format!("failed to start {}: {}", command, e),
            },
        }
    }

    async fn version_info(&self, channel: Channel) -> VsixResult<CodeVersion> {
        let command = self.command(channel);
        debug!("Querying {} --version", command);

        let output = Command::new(command)
            .arg("--version")
            .output()
            .await
            .map_err(|e| VsixError::Installer {
                command: command.to_string(),
                message: "failed to start version query".to_string(),
                source: Some(e),
            })?;

        if !output.status.success() {
            return Err(VsixError::Installer {
                command: command.to_string(),
                message: format!("--version exited with {}", output.status),
                source: None,
            });
        }

        parse_version_output(command, &String::from_utf8_lossy(&output.stdout))
    }
}
