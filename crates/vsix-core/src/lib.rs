//! # vsix-core
//!
//! Core types and utilities shared across all vsix-fetch crates.
//!
//! This crate provides:
//! - `PackageIdentifier` parsing with configurable token separators
//! - Upstream URL templates and resolution
//! - `VsixError` for unified error handling
//! - Download directory helpers
//!
//! ## Architecture
//!
//! - `types`: identifiers, upstreams, channels
//! - `error`: error types and result aliases
//! - `utils`: path helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{VsixError, VsixResult};
pub use types::{
    Channel, IdentifierFormat, PackageIdentifier, UpstreamName, UpstreamTable, UpstreamTemplate,
};
