//! Validated run configuration

use camino::Utf8PathBuf;
use vsix_core::error::VsixError;
use vsix_core::types::upstream::placeholder_names;
use vsix_core::types::{Channel, IdentifierFormat, UpstreamName, UpstreamTable, UpstreamTemplate};

use crate::toml::VsixToml;
use crate::ConfigResult;

/// User agent sent when no configuration overrides it
pub const DEFAULT_USER_AGENT: &str = "python-requests/2.22.0";
/// Extension whose installation also needs the VS Code server bundle
pub const DEFAULT_COMPANION_MARKER: &str = "remote-ssh";
/// VS Code server bundle for a given commit and build quality
pub const DEFAULT_COMPANION_URL: &str =
    "https://update.code.visualstudio.com/commit:{commit}/server-linux-x64/{quality}";

const COMPANION_PLACEHOLDERS: [&str; 2] = ["commit", "quality"];

/// Installer executables per channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerCommands {
    pub stable: String,
    pub insiders: String,
}

impl InstallerCommands {
    pub fn for_channel(&self, channel: Channel) -> &str {
        match channel {
            Channel::Stable => &self.stable,
            Channel::Insiders => &self.insiders,
        }
    }
}

impl Default for InstallerCommands {
    fn default() -> Self {
        Self {
            stable: "code".to_string(),
            insiders: "code-insiders".to_string(),
        }
    }
}

/// Companion bundle settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionConfig {
    pub marker: String,
    pub url_template: String,
}

/// Fully layered and validated configuration for one run
#[derive(Debug, Clone)]
pub struct VsixConfig {
    pub upstream: UpstreamName,
    pub upstreams: UpstreamTable,
    pub identifier_format: IdentifierFormat,
    pub download_dir: Utf8PathBuf,
    pub user_agent: String,
    pub download_only: bool,
    pub channel: Channel,
    pub installer: InstallerCommands,
    /// `None` when the companion download is disabled
    pub companion: Option<CompanionConfig>,
}

impl VsixConfig {
    /// Validate a merged configuration layer, filling in defaults
    pub fn from_toml(raw: VsixToml) -> ConfigResult<Self> {
        let upstream = match raw.fetch.upstream.as_deref() {
            Some(name) => name.parse()?,
            None => UpstreamName::default(),
        };

        let mut upstreams = UpstreamTable::default();
        for (name, pattern) in raw.upstreams {
            let upstream_name: UpstreamName = name.parse()?;
            let template = UpstreamTemplate::new(&format!("upstreams.{}", name), pattern)?;
            upstreams.insert(upstream_name, template);
        }

        let identifier_format = IdentifierFormat::new(
            raw.identifier
                .name_separator
                .unwrap_or(IdentifierFormat::DEFAULT_NAME_SEPARATOR),
            raw.identifier
                .version_separator
                .unwrap_or(IdentifierFormat::DEFAULT_VERSION_SEPARATOR),
        )?;

        let user_agent = raw
            .fetch
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        if user_agent.trim().is_empty() {
            return Err(VsixError::ConfigValidation {
                field: "fetch.user-agent".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let defaults = InstallerCommands::default();
        let installer = InstallerCommands {
            stable: non_empty("installer.stable", raw.installer.stable)?.unwrap_or(defaults.stable),
            insiders: non_empty("installer.insiders", raw.installer.insiders)?
                .unwrap_or(defaults.insiders),
        };

        let companion = if raw.companion.enabled.unwrap_or(true) {
            let url_template = raw
                .companion
                .url
                .unwrap_or_else(|| DEFAULT_COMPANION_URL.to_string());
            validate_companion_url(&url_template)?;
            Some(CompanionConfig {
                marker: non_empty("companion.marker", raw.companion.marker)?
                    .unwrap_or_else(|| DEFAULT_COMPANION_MARKER.to_string()),
                url_template,
            })
        } else {
            None
        };

        Ok(Self {
            upstream,
            upstreams,
            identifier_format,
            download_dir: raw.fetch.download_dir.unwrap_or_else(|| Utf8PathBuf::from(".")),
            user_agent,
            download_only: raw.fetch.download_only.unwrap_or(false),
            channel: raw.fetch.channel.unwrap_or_default(),
            installer,
            companion,
        })
    }

    /// Installer executable for the configured channel
    pub fn installer_command(&self) -> &str {
        self.installer.for_channel(self.channel)
    }
}

fn non_empty(field: &str, value: Option<String>) -> ConfigResult<Option<String>> {
    match value {
        Some(v) if v.trim().is_empty() => Err(VsixError::ConfigValidation {
            field: field.to_string(),
            reason: "must not be empty".to_string(),
        }),
        other => Ok(other),
    }
}

fn validate_companion_url(template: &str) -> ConfigResult<()> {
    let invalid = |reason: String| VsixError::ConfigValidation {
        field: "companion.url".to_string(),
        reason,
    };

    let names = placeholder_names(template).map_err(|r| invalid(r.to_string()))?;
    for name in names {
        if !COMPANION_PLACEHOLDERS.contains(&name) {
            return Err(invalid(format!("unknown placeholder '{{{}}}'", name)));
        }
    }
    if !template.contains("{commit}") {
        return Err(invalid("must reference {commit}".to_string()));
    }
    Ok(())
}
