//! Error types for the metadata client.

use thiserror::Error;

/// Errors that can occur when talking to the metadata service.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Service returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Invalid service URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse service response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Writing a download to disk failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Service is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),
}

/// Result type for metadata client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

impl From<ClientError> for encore_core::CoreError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::ParseError(msg) => encore_core::CoreError::Other(msg),
            other => encore_core::CoreError::network(other.to_string()),
        }
    }
}
