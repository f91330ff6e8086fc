//! Encore Storage
//!
//! Synchronous key-value persistence for the playback session.
//!
//! # Architecture
//!
//! - **Store trait**: [`KeyValueStore`] is the process-wide string store
//!   (get/set/delete). [`MemoryStore`] backs tests and ephemeral sessions,
//!   [`RedbStore`] persists to a single file.
//! - **Vertical Slicing**: each concern owns its keys and logic
//!   ([`playback_session`], [`liked_tracks`]).
//! - **Context**: [`SessionStore`] bundles the slices behind one handle so
//!   callers never touch raw keys.
//!
//! # Example
//!
//! ```rust
//! use encore_storage::{MemoryStore, SessionPatch, SessionStore};
//! use encore_core::TrackId;
//! use std::sync::Arc;
//!
//! let store = SessionStore::new(Arc::new(MemoryStore::new()));
//! store.save(&SessionPatch::new().last_played(TrackId::new("a1")).volume(0.4))?;
//!
//! let session = store.load()?.expect("session was saved");
//! assert_eq!(session.volume, 0.4);
//! # Ok::<(), encore_storage::StorageError>(())
//! ```

mod context;
mod error;
mod kv;
mod redb_store;

// Vertical slices
pub mod liked_tracks;
pub mod playback_session;

pub use context::SessionStore;
pub use error::{Result, StorageError};
pub use kv::{KeyValueStore, MemoryStore};
pub use playback_session::{PersistedSession, SessionPatch};
pub use redb_store::RedbStore;
