//! Configuration layering, fallback logic, and environment overrides

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use tracing::debug;
use vsix_core::error::VsixError;

use crate::settings::VsixConfig;
use crate::toml::{load_from_file, VsixToml};
use crate::ConfigResult;

/// Project configuration file name
pub const CONFIG_FILE_NAME: &str = "vsix.toml";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
    /// Directory holding the global `config.toml`; `None` disables it
    global_dir: Option<Utf8PathBuf>,
}

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Global config file
    Global(Utf8PathBuf),
    /// Project vsix.toml file
    Project(Utf8PathBuf),
    /// File named on the command line
    Explicit(Utf8PathBuf),
    /// Environment variable
    Environment(String),
    /// CLI flag
    CommandLine,
}

impl ConfigLoader {
    /// Create a loader rooted at `cwd` using `~/.vsix` for global config
    pub fn new(cwd: Utf8PathBuf) -> Self {
        let global_dir = dirs::home_dir()
            .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
            .map(|home| home.join(".vsix"));
        Self { cwd, global_dir }
    }

    /// Override (or disable) the global configuration directory
    pub fn with_global_dir(mut self, global_dir: Option<Utf8PathBuf>) -> Self {
        self.global_dir = global_dir;
        self
    }

    pub fn global_dir(&self) -> Option<&Utf8Path> {
        self.global_dir.as_deref()
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        self.cwd
            .ancestors()
            .map(|dir| dir.join(filename))
            .find(|candidate| candidate.is_file())
    }

    /// Load the global configuration, if one exists
    pub async fn load_global_config(&self) -> ConfigResult<Option<(VsixToml, ConfigSource)>> {
        let Some(dir) = &self.global_dir else {
            return Ok(None);
        };
        let path = dir.join("config.toml");
        if !path.is_file() {
            return Ok(None);
        }
        let config = load_from_file(&path).await?;
        Ok(Some((config, ConfigSource::Global(path))))
    }

    /// Load the project configuration, preferring an explicit path
    pub async fn load_project_config(
        &self,
        explicit: Option<&Utf8Path>,
    ) -> ConfigResult<Option<(VsixToml, ConfigSource)>> {
        if let Some(path) = explicit {
            let path = self.cwd.join(path);
            if !path.is_file() {
                return Err(VsixError::ConfigValidation {
                    field: "config".to_string(),
                    reason: format!("{} does not exist", path),
                });
            }
            let config = load_from_file(&path).await?;
            return Ok(Some((config, ConfigSource::Explicit(path))));
        }

        match self.resolve_config_path(CONFIG_FILE_NAME) {
            Some(path) => {
                let config = load_from_file(&path).await?;
                Ok(Some((config, ConfigSource::Project(path))))
            }
            None => Ok(None),
        }
    }

    /// Build the run configuration from every layer.
    ///
    /// Precedence, lowest first: built-in defaults, global file, project (or
    /// explicit) file, environment, command line.
    pub async fn load(
        &self,
        explicit: Option<&Utf8Path>,
        env: &HashMap<String, String>,
        cli: VsixToml,
    ) -> ConfigResult<(VsixConfig, Vec<ConfigSource>)> {
        let mut sources = Vec::new();
        let mut merged = VsixToml::default();

        for layer in [
            self.load_global_config().await?,
            self.load_project_config(explicit).await?,
        ]
        .into_iter()
        .flatten()
        {
            let (config, source) = layer;
            debug!("Loaded configuration layer {:?}", source);
            merged = merged.merge(config);
            sources.push(source);
        }

        let (env_layer, env_sources) = ConfigLayering::env_layer(env)?;
        merged = merged.merge(env_layer);
        sources.extend(env_sources);

        if cli != VsixToml::default() {
            sources.push(ConfigSource::CommandLine);
        }
        merged = merged.merge(cli);

        let config = VsixConfig::from_toml(merged)?;
        Ok((config, sources))
    }
}

/// Environment variable overrides
pub struct ConfigLayering;

impl ConfigLayering {
    /// Turn `VSIX_*` variables into a configuration layer
    pub fn env_layer(
        env: &HashMap<String, String>,
    ) -> ConfigResult<(VsixToml, Vec<ConfigSource>)> {
        let mut layer = VsixToml::default();
        let mut sources = Vec::new();

        let mut keys: Vec<&String> = env.keys().collect();
        keys.sort();

        for key in keys {
            let value = env[key].clone();
            match key.as_str() {
                "VSIX_UPSTREAM" => layer.fetch.upstream = Some(value),
                "VSIX_DOWNLOAD_DIR" => layer.fetch.download_dir = Some(Utf8PathBuf::from(value)),
                "VSIX_USER_AGENT" => layer.fetch.user_agent = Some(value),
                "VSIX_CODE_BIN" => layer.installer.stable = Some(value),
                "VSIX_CODE_INSIDERS_BIN" => layer.installer.insiders = Some(value),
                "VSIX_DOWNLOAD_ONLY" => {
                    layer.fetch.download_only = Some(parse_bool(key, &value)?);
                }
                _ => continue,
            }
            sources.push(ConfigSource::Environment(key.clone()));
        }

        Ok((layer, sources))
    }

    /// Collect `VSIX_*` variables from the process environment
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("VSIX_"))
            .collect()
    }
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(VsixError::ConfigValidation {
            field: key.to_string(),
            reason: format!("'{}' is not a boolean", value),
        }),
    }
}
