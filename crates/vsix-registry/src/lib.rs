//! HTTP layer for vsix-fetch
//!
//! Downloads extension packages and companion bundles with a fixed header set
//! and exposes the gallery's rate limit signals to the caller. Retrying is the
//! caller's decision; this crate never retries on its own.

pub mod client;
pub mod ratelimit;

// Re-export main types
pub use client::{FetchOutcome, VsixClient};
pub use ratelimit::RateLimitStatus;

use vsix_core::error::VsixError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, VsixError>;
