//! Claims DW Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling, logging, and file-identity utilities for the
//! claims data warehouse workspace.
//!
//! # Overview
//!
//! - **Error Handling**: the [`StageError`] type and [`Result`] alias
//! - **Logging**: tracing subscriber setup driven by environment variables
//! - **Fingerprinting**: streaming size/hash/row-count identity for seed files

pub mod error;
pub mod fingerprint;
pub mod logging;

// Re-export commonly used types
pub use error::{Result, StageError};
pub use fingerprint::Fingerprint;
