/// Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Store could not be reached (lock poisoned, file unavailable)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Stored value could not be parsed
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    /// Database error from redb
    #[error(transparent)]
    Database(#[from] redb::Error),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an invalid value error
    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl From<StorageError> for encore_core::CoreError {
    fn from(err: StorageError) -> Self {
        encore_core::CoreError::Other(err.to_string())
    }
}
