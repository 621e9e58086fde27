use thiserror::Error;

/// Why a single weather fetch did not produce an observation.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        FetchError::MalformedResponse(msg.into())
    }
}

/// Failure of the backing database.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid timestamp '{0}' in stored row")]
    Timestamp(String),
}
