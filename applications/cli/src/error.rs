/// CLI error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] encore_storage::StorageError),

    #[error("Client error: {0}")]
    Client(#[from] encore_client::ClientError),

    #[error("Resolution error: {0}")]
    Resolution(#[from] encore_playback::ResolutionError),

    #[error("Playback error: {0}")]
    Playback(#[from] encore_playback::PlaybackError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}
