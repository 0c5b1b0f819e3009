//! vsix benchmarking suite
//!
//! Benchmarks for identifier parsing, list files, configuration and upstream
//! URL resolution.

pub mod common;

pub use common::*;
