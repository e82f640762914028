//! Error types for the store boundary and the fallback controller.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for key-value store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store read failed for {key}: {message}")]
    Read { key: String, message: String },

    #[error("store write failed for {key}: {message}")]
    Write { key: String, message: String },

    #[error("malformed record at {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid store URL: {0}")]
    InvalidUrl(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Why a fallback decision could not be completed.
///
/// None of these are retried. The caller shows the apology text and logs
/// the cause.
#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("failed to read fallback record for {user_id}: {source}")]
    StoreRead {
        user_id: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to update fallback record for {user_id}: {source}")]
    StoreWrite {
        user_id: String,
        #[source]
        source: StoreError,
    },

    #[error("unexpected error handling fallback for {user_id}: {message}")]
    Unknown { user_id: String, message: String },
}

impl FallbackError {
    /// Stable machine-readable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StoreRead { .. } => "STORE_READ",
            Self::StoreWrite { .. } => "STORE_WRITE",
            Self::Unknown { .. } => "UNKNOWN",
        }
    }

    /// The user the failed decision was for.
    pub fn user_id(&self) -> &str {
        match self {
            Self::StoreRead { user_id, .. }
            | Self::StoreWrite { user_id, .. }
            | Self::Unknown { user_id, .. } => user_id,
        }
    }
}
