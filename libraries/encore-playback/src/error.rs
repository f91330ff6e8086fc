//! Error types for the playback session

use crate::types::ErrorKind;
use encore_core::{CoreError, TrackId};
use encore_storage::StorageError;
use thiserror::Error;

/// Why a track id could not be turned into a stream URL
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// Empty track id
    #[error("Track id cannot be empty")]
    EmptyTrackId,

    /// The metadata service has no such track
    #[error("Track not found: {0}")]
    NotFound(TrackId),

    /// Every stream candidate was missing a URL
    #[error("No playable source for track {0}")]
    NoPlayableSource(TrackId),

    /// Metadata lookup failed in transport
    #[error("Metadata lookup failed: {0}")]
    Lookup(#[from] CoreError),
}

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Stream resolution failed
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The resource factory cannot play the resolved stream
    #[error("Playback unsupported: {0}")]
    PlaybackUnsupported(String),

    /// Playback start was refused (autoplay policy, device busy)
    #[error("Playback blocked: {0}")]
    PlaybackBlocked(String),

    /// Resource-level fault (decode, network)
    #[error("Playback failed: {0}")]
    PlaybackFailure(String),

    /// Session store could not be read or written
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(#[from] StorageError),

    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// A newer attach replaced the one this result belongs to
    #[error("Attach superseded by a newer track")]
    Superseded,

    /// The session task has stopped
    #[error("Playback session closed")]
    SessionClosed,
}

impl PlaybackError {
    /// Error category shown to listeners, if this error is user-visible
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Resolution(_) => Some(ErrorKind::Resolution),
            Self::PlaybackUnsupported(_) => Some(ErrorKind::PlaybackUnsupported),
            Self::PlaybackBlocked(_) => Some(ErrorKind::PlaybackBlocked),
            Self::PlaybackFailure(_) => Some(ErrorKind::PlaybackFailure),
            Self::PersistenceUnavailable(_) => Some(ErrorKind::PersistenceUnavailable),
            Self::NoTrackLoaded | Self::Superseded | Self::SessionClosed => None,
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
