use std::io;

use thiserror::Error;

/// Failures raised by a [`RemoteTableStore`](crate::storage::RemoteTableStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Error type that captures ledger failures surfaced to callers.
///
/// Read failures never appear here: the reader degrades to an empty table
/// after its retry budget is spent.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Failed to write ledger: {0}")]
    WriteFailure(#[source] StoreError),
    #[error("Row {index} is out of range (ledger has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },
    #[error("Row {row}: expense date `{value}` does not match DD/MM/YYYY")]
    DateParse { row: usize, value: String },
}

/// Configuration persistence failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serde(String),
}
