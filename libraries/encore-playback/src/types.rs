//! Core types for the playback session

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Playback status
///
/// `Idle → Loading → Ready → Playing ⇄ Paused → Ended`, or `Errored` from any
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// No track bound
    #[default]
    Idle,

    /// Resolving the stream for a newly bound track
    Loading,

    /// Resource created, not yet playing
    Ready,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Reached the end without looping
    Ended,

    /// Resolution or resource fault; inert until the next attach
    Errored,
}

impl PlaybackStatus {
    /// Whether only a new attach can leave this status
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Errored)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Ended => "ended",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-visible error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    Resolution,
    PlaybackUnsupported,
    /// Rendered as a "tap to play" affordance
    PlaybackBlocked,
    PlaybackFailure,
    PersistenceUnavailable,
}

/// Dismissible message carried by the view model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: ErrorKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_tap_to_play(&self) -> bool {
        self.kind == ErrorKind::PlaybackBlocked
    }
}

/// One position/duration reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionSample {
    pub position_seconds: f64,
    pub duration_seconds: Option<f64>,
}

/// Lowest and highest position sample rates (Hz)
pub const MIN_POSITION_RATE_HZ: u32 = 4;
pub const MAX_POSITION_RATE_HZ: u32 = 30;

/// Configuration for the playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seeks requested within this window collapse into one (default: 50)
    pub seek_coalesce_ms: u64,

    /// Position samples per second while playing, clamped to 4..=30 (default: 4)
    pub position_rate_hz: u32,

    /// Minimum gap between persisted position writes (default: 1000)
    pub persist_interval_ms: u64,

    /// Added to a restored position before seeking (default: 1.0)
    pub resume_offset_secs: f64,

    /// Volume used when nothing is persisted, 0.0-1.0 (default: 1.0)
    pub initial_volume: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seek_coalesce_ms: 50,
            position_rate_hz: MIN_POSITION_RATE_HZ,
            persist_interval_ms: 1000,
            resume_offset_secs: 1.0,
            initial_volume: 1.0,
        }
    }
}

impl SessionConfig {
    pub fn seek_coalesce(&self) -> Duration {
        Duration::from_millis(self.seek_coalesce_ms)
    }

    /// Period between position samples
    pub fn position_interval(&self) -> Duration {
        let hz = self
            .position_rate_hz
            .clamp(MIN_POSITION_RATE_HZ, MAX_POSITION_RATE_HZ);
        Duration::from_secs(1) / hz
    }

    pub fn persist_interval(&self) -> Duration {
        Duration::from_millis(self.persist_interval_ms)
    }
}
