use thiserror::Error;

/// Failure of a single record store call.
///
/// Stages never propagate these past the record being processed: the call is
/// logged and treated as having had no effect.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),

    #[error("Record {id} not found in '{table}'")]
    NotFound { table: String, id: String },
}

/// A stored `Compressed JSON` value that cannot be used.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("invalid profile JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("profile document is empty")]
    Empty,
}
