//! Core data types for vsix-fetch.
//!
//! - Extension identifiers and the token formats they are written in
//! - Upstream names and their URL templates
//! - VS Code release channels

pub mod channel;
pub mod identifier;
pub mod upstream;

// Re-export all public types
pub use channel::Channel;
pub use identifier::{IdentifierFormat, PackageIdentifier};
pub use upstream::{UpstreamName, UpstreamTable, UpstreamTemplate};
