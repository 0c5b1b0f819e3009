//! vsix.toml parsing
//!
//! Every field is optional so that files, environment and command line flags
//! can be layered on top of each other before validation.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vsix_core::error::VsixError;
use vsix_core::types::Channel;

use crate::ConfigResult;

/// Raw contents of one configuration layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VsixToml {
    /// Download behaviour
    #[serde(default)]
    pub fetch: FetchSection,

    /// Token separators
    #[serde(default)]
    pub identifier: IdentifierSection,

    /// URL template overrides keyed by upstream name
    #[serde(default)]
    pub upstreams: BTreeMap<String, String>,

    /// Installer commands per channel
    #[serde(default)]
    pub installer: InstallerSection,

    /// Companion server bundle
    #[serde(default)]
    pub companion: CompanionSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FetchSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,

    /// Parent of the per-run `vsix-<timestamp>` directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<Utf8PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_only: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct IdentifierSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_separator: Option<char>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_separator: Option<char>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallerSection {
    /// Command for the stable channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stable: Option<String>,

    /// Command for the insiders channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insiders: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanionSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Extension name that triggers the companion download
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,

    /// Bundle URL with `{commit}` and `{quality}` placeholders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl VsixToml {
    /// Overlay `other` on top of `self`; fields set in `other` win
    pub fn merge(mut self, other: VsixToml) -> VsixToml {
        let fetch = other.fetch;
        self.fetch.upstream = fetch.upstream.or(self.fetch.upstream);
        self.fetch.download_dir = fetch.download_dir.or(self.fetch.download_dir);
        self.fetch.user_agent = fetch.user_agent.or(self.fetch.user_agent);
        self.fetch.download_only = fetch.download_only.or(self.fetch.download_only);
        self.fetch.channel = fetch.channel.or(self.fetch.channel);

        let identifier = other.identifier;
        self.identifier.name_separator = identifier
            .name_separator
            .or(self.identifier.name_separator);
        self.identifier.version_separator =
            identifier.version_separator.or(self.identifier.version_separator);

        self.upstreams.extend(other.upstreams);

        let installer = other.installer;
        self.installer.stable = installer.stable.or(self.installer.stable);
        self.installer.insiders = installer.insiders.or(self.installer.insiders);

        let companion = other.companion;
        self.companion.enabled = companion.enabled.or(self.companion.enabled);
        self.companion.marker = companion.marker.or(self.companion.marker);
        self.companion.url = companion.url.or(self.companion.url);

        self
    }
}

/// Parse a TOML string; `file` names the source in error messages
pub fn parse_vsix_toml(content: &str, file: &str) -> ConfigResult<VsixToml> {
    toml::from_str(content).map_err(|e| {
        let (line, column) = e
            .span()
            .map(|span| line_column(content, span.start))
            .unwrap_or((0, 0));
        VsixError::TomlParse {
            file: file.to_string(),
            message: e.message().to_string(),
            line,
            column,
        }
    })
}

/// Load and parse a configuration file
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<VsixToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| VsixError::io(format!("Failed to read {}", path), e))?;

    parse_vsix_toml(&content, path.as_str())
}

/// 1-based line and column of a byte offset
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let before = &content[..offset.min(content.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(before.len(), |nl| before.len() - nl - 1) + 1;
    (line, column)
}
