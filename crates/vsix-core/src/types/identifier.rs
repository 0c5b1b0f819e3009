//! Extension identifier parsing.
//!
//! A token names one extension build: `publisher.extension@1.2.3`. Older list
//! files use `-` in place of `@`, so the separators come from an
//! [`IdentifierFormat`] rather than being fixed.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{VsixError, VsixResult};

/// A parsed `publisher.name@version` triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageIdentifier {
    publisher: String,
    name: String,
    version: String,
}

impl PackageIdentifier {
    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}@{}", self.publisher, self.name, self.version)
    }
}

/// Separators used to split a raw token into its three fields
#[derive(Debug, Clone)]
pub struct IdentifierFormat {
    name_separator: char,
    version_separator: char,
    pattern: Regex,
}

impl IdentifierFormat {
    /// Default name separator (`publisher.extension`)
    pub const DEFAULT_NAME_SEPARATOR: char = '.';
    /// Default version separator (`extension@version`)
    pub const DEFAULT_VERSION_SEPARATOR: char = '@';

    /// Build a format from a pair of separators.
    ///
    /// Separators must be ASCII punctuation other than `_` and must differ
    /// from each other, otherwise the token would be ambiguous.
    pub fn new(name_separator: char, version_separator: char) -> VsixResult<Self> {
        for (field, sep) in [
            ("identifier.name-separator", name_separator),
            ("identifier.version-separator", version_separator),
        ] {
            if !sep.is_ascii_punctuation() || sep == '_' {
                return Err(VsixError::ConfigValidation {
                    field: field.to_string(),
                    reason: format!("'{}' cannot be used as a separator", sep),
                });
            }
            // Tokens double as artifact file names
            if sep == '/' || sep == '\\' {
                return Err(VsixError::ConfigValidation {
                    field: field.to_string(),
                    reason: format!("'{}' is a path separator", sep),
                });
            }
        }
        if name_separator == version_separator {
            return Err(VsixError::ConfigValidation {
                field: "identifier".to_string(),
                reason: "name and version separators must differ".to_string(),
            });
        }
        if name_separator == '-' {
            return Err(VsixError::ConfigValidation {
                field: "identifier.name-separator".to_string(),
                reason: "'-' is valid inside publisher names".to_string(),
            });
        }

        let source = format!(
            r"^(?P<publisher>[A-Za-z0-9_-]+){}(?P<name>[A-Za-z0-9_-]+){}(?P<version>[0-9]+(?:\.[0-9]+)*)$",
            regex::escape(&name_separator.to_string()),
            regex::escape(&version_separator.to_string()),
        );
        let pattern = Regex::new(&source).map_err(|e| VsixError::ConfigValidation {
            field: "identifier".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            name_separator,
            version_separator,
            pattern,
        })
    }

    /// Format for `publisher.extension-version` tokens
    pub fn dashed() -> Self {
        Self::new(Self::DEFAULT_NAME_SEPARATOR, '-')
            .unwrap_or_else(|_| unreachable!("built-in separators are valid"))
    }

    pub fn name_separator(&self) -> char {
        self.name_separator
    }

    pub fn version_separator(&self) -> char {
        self.version_separator
    }

    /// Parse a raw token. The whole token must match; nothing is trimmed.
    pub fn parse(&self, token: &str) -> VsixResult<PackageIdentifier> {
        let captures = self
            .pattern
            .captures(token)
            .ok_or_else(|| self.malformed(token))?;

        Ok(PackageIdentifier {
            publisher: captures["publisher"].to_string(),
            name: captures["name"].to_string(),
            version: captures["version"].to_string(),
        })
    }

    /// Rebuild the token for an identifier using this format's separators
    pub fn render(&self, id: &PackageIdentifier) -> String {
        format!(
            "{}{}{}{}{}",
            id.publisher, self.name_separator, id.name, self.version_separator, id.version
        )
    }

    fn malformed(&self, token: &str) -> VsixError {
        let reason = if token.is_empty() {
            "identifier is empty".to_string()
        } else if !token.contains(self.name_separator) {
            format!("missing '{}' between publisher and extension", self.name_separator)
        } else if !token.contains(self.version_separator) {
            format!("missing '{}version' suffix", self.version_separator)
        } else {
            format!(
                "expected 'publisher{}extension{}version' with names made of letters, digits, '_' or '-' and a dotted numeric version",
                self.name_separator, self.version_separator
            )
        };

        VsixError::MalformedIdentifier {
            token: token.to_string(),
            reason,
        }
    }
}

impl Default for IdentifierFormat {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME_SEPARATOR, Self::DEFAULT_VERSION_SEPARATOR)
            .unwrap_or_else(|_| unreachable!("built-in separators are valid"))
    }
}
