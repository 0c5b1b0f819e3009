//! Upstream URL templates and resolution.
//!
//! Each upstream is a URL pattern containing `{publisher}`, `{extension}` and
//! `{version}` placeholders. Templates are checked when they are built, so
//! resolving an identifier is plain substitution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

use super::PackageIdentifier;
use crate::error::{VsixError, VsixResult};

/// Placeholders an extension URL template may reference
pub const PLACEHOLDERS: [&str; 3] = ["publisher", "extension", "version"];

/// Public gallery endpoint
pub const MARKETPLACE_TEMPLATE: &str = "https://marketplace.visualstudio.com/_apis/public/gallery/publishers/{publisher}/vsextensions/{extension}/{version}/vspackage";

/// Publisher-hosted CDN asset endpoint
pub const PUBLISHER_ASSET_TEMPLATE: &str = "https://{publisher}.gallery.vsassets.io/_apis/public/gallery/publisher/{publisher}/extension/{extension}/{version}/assetbyname/Microsoft.VisualStudio.Services.VSIXPackage";

/// Local HTTP server serving pre-staged `.vsix` files
pub const LOCAL_TEMPLATE: &str = "http://localhost:8000/{publisher}.{extension}-{version}.vsix";

/// Named upstream sources
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum UpstreamName {
    Local,
    Marketplace,
    #[default]
    #[serde(alias = "publisher")]
    PublisherAsset,
}

impl UpstreamName {
    pub const ALL: [UpstreamName; 3] = [
        UpstreamName::Local,
        UpstreamName::Marketplace,
        UpstreamName::PublisherAsset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamName::Local => "local",
            UpstreamName::Marketplace => "marketplace",
            UpstreamName::PublisherAsset => "publisher-asset",
        }
    }

    /// Built-in template for this upstream
    pub fn default_template(&self) -> &'static str {
        match self {
            UpstreamName::Local => LOCAL_TEMPLATE,
            UpstreamName::Marketplace => MARKETPLACE_TEMPLATE,
            UpstreamName::PublisherAsset => PUBLISHER_ASSET_TEMPLATE,
        }
    }
}

impl fmt::Display for UpstreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpstreamName {
    type Err = VsixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(UpstreamName::Local),
            "marketplace" => Ok(UpstreamName::Marketplace),
            // Older configurations call the CDN upstream just "publisher"
            "publisher-asset" | "publisher" => Ok(UpstreamName::PublisherAsset),
            other => Err(VsixError::UnknownUpstream {
                name: other.to_string(),
            }),
        }
    }
}

/// A validated URL template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTemplate {
    pattern: String,
}

impl UpstreamTemplate {
    /// Validate a template against the known placeholders
    pub fn new(field: &str, pattern: impl Into<String>) -> VsixResult<Self> {
        let pattern = pattern.into();
        let invalid = |reason: String| VsixError::ConfigValidation {
            field: field.to_string(),
            reason,
        };

        for name in placeholder_names(&pattern).map_err(|r| invalid(r.to_string()))? {
            if !PLACEHOLDERS.contains(&name) {
                return Err(invalid(format!("unknown placeholder '{{{}}}'", name)));
            }
        }

        let sample = substitute(&pattern, "publisher", "extension", "0.0.0");
        Url::parse(&sample).map_err(|e| invalid(format!("not a valid URL template: {}", e)))?;

        Ok(Self { pattern })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Substitute an identifier into the template
    pub fn expand(&self, id: &PackageIdentifier) -> VsixResult<Url> {
        let raw = substitute(&self.pattern, id.publisher(), id.name(), id.version());
        Url::parse(&raw).map_err(|e| VsixError::MalformedIdentifier {
            token: id.to_string(),
            reason: format!("produces an invalid URL '{}': {}", raw, e),
        })
    }
}

/// The set of upstream templates available to a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTable {
    templates: BTreeMap<UpstreamName, UpstreamTemplate>,
}

impl UpstreamTable {
    /// A table with no upstreams configured
    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    /// Register or replace the template for an upstream
    pub fn insert(&mut self, upstream: UpstreamName, template: UpstreamTemplate) {
        self.templates.insert(upstream, template);
    }

    /// Resolve the fetch URL for an identifier on the chosen upstream
    pub fn resolve(&self, upstream: UpstreamName, id: &PackageIdentifier) -> VsixResult<Url> {
        self.templates
            .get(&upstream)
            .ok_or_else(|| VsixError::UnknownUpstream {
                name: upstream.to_string(),
            })?
            .expand(id)
    }
}

impl Default for UpstreamTable {
    fn default() -> Self {
        let templates = UpstreamName::ALL
            .into_iter()
            .map(|name| {
                let template = UpstreamTemplate {
                    pattern: name.default_template().to_string(),
                };
                (name, template)
            })
            .collect();
        Self { templates }
    }
}

fn substitute(pattern: &str, publisher: &str, extension: &str, version: &str) -> String {
    pattern
        .replace("{publisher}", publisher)
        .replace("{extension}", extension)
        .replace("{version}", version)
}

/// Names between `{` and `}` in a template, in order of appearance
pub fn placeholder_names(pattern: &str) -> Result<Vec<&str>, &'static str> {
    let mut names = Vec::new();
    let mut rest = pattern;

    while let Some(open) = rest.find(['{', '}']) {
        if rest[open..].starts_with('}') {
            return Err("unbalanced '}'");
        }
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or("unclosed '{'")?;
        let name = &after[..close];
        if name.is_empty() || name.contains('{') {
            return Err("empty or nested placeholder");
        }
        names.push(name);
        rest = &after[close + 1..];
    }

    Ok(names)
}
