//! Error types for mtg_export
//!
//! Everything in here is fatal: the run stops and no CSV is written.
//! Recoverable conditions live in [`crate::diagnostics`] instead.

use thiserror::Error;

/// Unified error type for mtg_export operations
#[derive(Debug, Error)]
pub enum ExportError {
    /// A local record could not be parsed or cannot be turned into a lookup
    #[error("{source_name}:{line}: {reason}")]
    InvalidRecord {
        source_name: String,
        line: usize,
        reason: String,
    },
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// CSV read or write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Deck JSON could not be parsed
    #[error("Invalid deck JSON: {0}")]
    InputJson(#[source] serde_json::Error),
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Service answered with a non-success status
    #[error("Scryfall returned {status}: {code}: {details}")]
    ApiResponse {
        status: u16,
        code: String,
        details: String,
    },
    /// Response body did not match the collection schema
    #[error("Malformed Scryfall response: {0}")]
    MalformedResponse(#[source] serde_json::Error),
    /// Price string that cannot be represented exactly
    #[error("Invalid price: '{raw}'")]
    InvalidPrice { raw: String },
    /// Lookup configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),
    /// Offline export needs a catalog id on every record
    #[error("Card has no multiverse id, cannot export offline: {name}")]
    MissingCatalogId { name: String },
}

/// Result alias for mtg_export operations
pub type Result<T> = std::result::Result<T, ExportError>;
