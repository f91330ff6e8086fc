//! Liked tracks
//!
//! A per-track flag stored under `liked-<track id>`. No business logic beyond
//! toggling; it is not part of the playback session and survives a session
//! clear.

use crate::error::Result;
use crate::kv::KeyValueStore;
use encore_core::TrackId;

/// Key prefix for liked flags
pub const KEY_PREFIX: &str = "liked-";

fn key_for(id: &TrackId) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// Whether a track is liked
pub fn is_liked<S: KeyValueStore + ?Sized>(store: &S, id: &TrackId) -> Result<bool> {
    Ok(store.get(&key_for(id))?.as_deref() == Some("true"))
}

/// Set the liked flag
///
/// Unliking removes the key rather than storing "false".
pub fn set_liked<S: KeyValueStore + ?Sized>(store: &S, id: &TrackId, liked: bool) -> Result<()> {
    if liked {
        store.set(&key_for(id), "true")
    } else {
        store.delete(&key_for(id))
    }
}

/// Flip the liked flag, returning the new value
pub fn toggle<S: KeyValueStore + ?Sized>(store: &S, id: &TrackId) -> Result<bool> {
    let liked = !is_liked(store, id)?;
    set_liked(store, id, liked)?;
    Ok(liked)
}
