//! Persisted playback session
//!
//! One small record per process: which track was playing, where, whether the
//! listener wanted it playing, and the loop/volume preferences. Each field
//! lives under its own key, so a partial save only rewrites the fields it
//! carries and independent writers (volume slider, position ticker) never
//! clobber each other.

use crate::error::{Result, StorageError};
use crate::kv::KeyValueStore;
use encore_core::TrackId;
use serde::{Deserialize, Serialize};
use tracing::warn;

// Key constants
/// Id of the last track bound to the session
pub const KEY_LAST_PLAYED: &str = "last-played";

/// Playback position in seconds
pub const KEY_POSITION: &str = "playback-position";

/// Whether the listener wants playback running ("true"/"false")
pub const KEY_PLAY_INTENT: &str = "play-intent";

/// Loop flag ("true"/"false")
pub const KEY_LOOP: &str = "loop";

/// Volume in [0, 1]
pub const KEY_VOLUME: &str = "audio-volume";

/// Unix timestamp (seconds) of the last save
pub const KEY_UPDATED_AT: &str = "updated-at";

const SESSION_KEYS: [&str; 6] = [
    KEY_LAST_PLAYED,
    KEY_POSITION,
    KEY_PLAY_INTENT,
    KEY_LOOP,
    KEY_VOLUME,
    KEY_UPDATED_AT,
];

/// Session state as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub last_played: TrackId,
    pub position_seconds: f64,
    pub play_intent: bool,
    pub looping: bool,
    pub volume: f32,
    /// Unix timestamp of the last save, if recorded
    pub updated_at: Option<i64>,
}

/// Partial update of the persisted session
///
/// Only fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    pub last_played: Option<TrackId>,
    pub position_seconds: Option<f64>,
    pub play_intent: Option<bool>,
    pub looping: Option<bool>,
    pub volume: Option<f32>,
}

impl SessionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_played(mut self, id: TrackId) -> Self {
        self.last_played = Some(id);
        self
    }

    pub fn position(mut self, seconds: f64) -> Self {
        self.position_seconds = Some(seconds);
        self
    }

    pub fn play_intent(mut self, playing: bool) -> Self {
        self.play_intent = Some(playing);
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = Some(looping);
        self
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Load the persisted session
///
/// Returns `None` when no track was ever recorded. Missing or malformed
/// fields fall back to defaults (position 0, play intent on, loop off,
/// full volume).
pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<PersistedSession>> {
    let Some(last_played) = store.get(KEY_LAST_PLAYED)? else {
        return Ok(None);
    };
    if last_played.trim().is_empty() {
        return Ok(None);
    }

    let position_seconds = read_parsed(store, KEY_POSITION)?
        .filter(|p: &f64| p.is_finite())
        .map_or(0.0, |p| p.max(0.0));
    let play_intent = read_parsed(store, KEY_PLAY_INTENT)?.unwrap_or(true);
    let looping = read_parsed(store, KEY_LOOP)?.unwrap_or(false);
    let volume = read_parsed(store, KEY_VOLUME)?
        .filter(|v: &f32| v.is_finite())
        .map_or(1.0, |v| v.clamp(0.0, 1.0));
    let updated_at = read_parsed(store, KEY_UPDATED_AT)?;

    Ok(Some(PersistedSession {
        last_played: TrackId::new(last_played),
        position_seconds,
        play_intent,
        looping,
        volume,
        updated_at,
    }))
}

/// Merge `patch` into the stored session
///
/// Volume is clamped to [0, 1]; positions are clamped to >= 0 and non-finite
/// positions are stored as 0.
pub fn save<S: KeyValueStore + ?Sized>(store: &S, patch: &SessionPatch) -> Result<()> {
    if patch.is_empty() {
        return Ok(());
    }

    if let Some(ref id) = patch.last_played {
        store.set(KEY_LAST_PLAYED, id.as_str())?;
    }
    if let Some(position) = patch.position_seconds {
        let position = if position.is_finite() {
            position.max(0.0)
        } else {
            0.0
        };
        store.set(KEY_POSITION, &position.to_string())?;
    }
    if let Some(play_intent) = patch.play_intent {
        store.set(KEY_PLAY_INTENT, &play_intent.to_string())?;
    }
    if let Some(looping) = patch.looping {
        store.set(KEY_LOOP, &looping.to_string())?;
    }
    if let Some(volume) = patch.volume {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            1.0
        };
        store.set(KEY_VOLUME, &volume.to_string())?;
    }

    let now = chrono::Utc::now().timestamp();
    store.set(KEY_UPDATED_AT, &now.to_string())
}

/// Delete every session key
pub fn clear<S: KeyValueStore + ?Sized>(store: &S) -> Result<()> {
    for key in SESSION_KEYS {
        store.delete(key)?;
    }
    Ok(())
}

fn read_parsed<S, T>(store: &S, key: &str) -> Result<Option<T>>
where
    S: KeyValueStore + ?Sized,
    T: std::str::FromStr,
{
    match store.get(key)? {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                let err = StorageError::invalid_value(key, raw);
                warn!(error = %err, "Ignoring unreadable session field");
                Ok(None)
            }
        },
    }
}
