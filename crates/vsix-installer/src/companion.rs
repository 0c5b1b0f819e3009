//! VS Code server bundle fetched alongside the remote development extension

use url::Url;
use vsix_core::error::{VsixError, VsixResult};
use vsix_core::utils::artifact_file_name;
use vsix_core::{Channel, PackageIdentifier};

/// Version information reported by `<installer> --version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeVersion {
    pub version: String,
    pub commit: String,
}

/// Whether `id` is the extension that needs the server bundle
pub fn is_companion_trigger(id: &PackageIdentifier, marker: &str) -> bool {
    id.name() == marker
}

/// Parse `--version` output: release on the first line, commit on the second.
pub fn parse_version_output(command: &str, stdout: &str) -> VsixResult<CodeVersion> {
    let mut lines = stdout.lines().map(str::trim);
    let invalid = |message: &str| VsixError::Installer {
        command: command.to_string(),
        message: message.to_string(),
        source: None,
    };

    let version = lines
        .next()
        .filter(|line| !line.is_empty())
        .ok_or_else(|| invalid("--version printed no version line"))?;
    let commit = lines
        .next()
        .filter(|line| !line.is_empty())
        .ok_or_else(|| invalid("--version printed no commit line"))?;

    if !commit.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid(&format!("'{}' does not look like a commit id", commit)));
    }
    if !version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(invalid(&format!("'{}' does not look like a version", version)));
    }

    Ok(CodeVersion {
        version: version.to_string(),
        commit: commit.to_string(),
    })
}

/// Expand the bundle URL template for a commit and channel
pub fn bundle_url(template: &str, commit: &str, channel: Channel) -> VsixResult<Url> {
    let expanded = template
        .replace("{commit}", commit)
        .replace("{quality}", channel.quality());
    Url::parse(&expanded).map_err(|e| VsixError::ConfigValidation {
        field: "companion.url".to_string(),
        reason: format!("'{}' is not a valid URL: {}", expanded, e),
    })
}

/// `vscode-server-<version>.tar.gz`
pub fn bundle_file_name(version: &str) -> VsixResult<String> {
    artifact_file_name(&format!("vscode-server-{}", version), "tar.gz")
}
