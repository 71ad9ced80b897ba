//! Error types for cloudmatch
//!
//! Library code uses `crate::error::Result<T>` which returns
//! `CloudmatchError`. CLI code uses `anyhow::Result<T>` for top-level
//! error handling; the conversion happens at the CLI boundary and
//! preserves error chains.
//!
//! Two classes of failure exist and only one of them lives here:
//!
//! - **Fatal/setup errors** (unsupported provider, invalid options,
//!   unreadable workload file) abort a run before any row is processed
//!   and surface as `CloudmatchError`.
//! - **Recoverable outcomes** (a region with no source data, a row with
//!   missing fields, a filter that matched nothing) are data, not errors:
//!   catalog loading falls back to sample data, selection returns
//!   `Selection::NoMatch`, and the orchestrator writes placeholder cells.
//!   None of those ever appear as a variant below.

use thiserror::Error;

/// Main error type for cloudmatch
#[derive(Error, Debug)]
pub enum CloudmatchError {
    #[error("Options error: {0}")]
    Options(#[from] OptionsError),

    #[error("Unsupported provider: {0} (supported: aws, azure, gcp)")]
    UnsupportedProvider(String),

    #[error("Data source error: {provider} {region_key}: {message}")]
    DataSource {
        provider: String,
        region_key: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Workload error: {field} - {reason}")]
    Workload { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Options-validation errors
#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Options file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse options: {0}")]
    ParseError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CloudmatchError>;
