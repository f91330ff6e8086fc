use crate::error::Result;
use crate::kv::KeyValueStore;
use crate::playback_session::{PersistedSession, SessionPatch};
use crate::{liked_tracks, playback_session};
use encore_core::TrackId;
use std::sync::Arc;

/// Session storage context
///
/// The single handle the session controller holds onto the process-wide
/// store. Cloning is cheap and every clone talks to the same store.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Backing store
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    // Playback session
    pub fn load(&self) -> Result<Option<PersistedSession>> {
        playback_session::load(self.store.as_ref())
    }

    pub fn save(&self, patch: &SessionPatch) -> Result<()> {
        playback_session::save(self.store.as_ref(), patch)
    }

    pub fn clear(&self) -> Result<()> {
        playback_session::clear(self.store.as_ref())
    }

    // Liked tracks
    pub fn is_liked(&self, id: &TrackId) -> Result<bool> {
        liked_tracks::is_liked(self.store.as_ref(), id)
    }

    pub fn set_liked(&self, id: &TrackId, liked: bool) -> Result<()> {
        liked_tracks::set_liked(self.store.as_ref(), id, liked)
    }

    pub fn toggle_liked(&self, id: &TrackId) -> Result<bool> {
        liked_tracks::toggle(self.store.as_ref(), id)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}
