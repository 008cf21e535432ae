use std::path::PathBuf;

use thiserror::Error;

/// Errors raised at the fallible edges of the crate: loading tables,
/// reading configuration and decoding AI responses. The rewrite itself
/// never fails.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("failed to read replacement table {path:?}: {source}")]
    ReplacementTable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("column '{0}' not found in replacement table")]
    MissingColumn(String),

    #[error("replacement for '{0}' is empty")]
    EmptySubstitute(String),

    #[error("plan response is empty after stripping markdown")]
    EmptyResponse,

    #[error("plan response is not valid JSON: {0}")]
    PlanJson(#[from] serde_json::Error),

    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: String, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = GuardError> = std::result::Result<T, E>;
