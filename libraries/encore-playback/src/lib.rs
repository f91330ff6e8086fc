//! Encore - Playback Session
//!
//! Keeps one authoritative "now playing" session for a streaming player.
//!
//! This crate provides:
//! - Stream resolution with quality fallback ([`StreamResolver`])
//! - A playback engine owning exactly one audio resource at a time
//! - Seek coalescing and a throttled position stream
//! - The session controller task: persisted resume, play intent, loop and
//!   volume, advance-on-end through a [`Navigator`](encore_core::Navigator)
//! - One shared view model observed by any number of view adapters
//!
//! # Architecture
//!
//! The controller runs as a single tokio task. Commands from
//! [`SessionHandle`]s, resource events, resolution results and timers are
//! processed strictly in order, so state never races. Audio output is
//! abstracted behind [`AudioResource`]; [`HeadlessResource`] is a clock-driven
//! implementation with no output device.
//!
//! # Example
//!
//! ```rust,no_run
//! use encore_playback::{
//!     HeadlessFactory, MiniBar, SessionConfig, SessionController, SessionParts, ViewAdapter,
//! };
//! use encore_storage::{MemoryStore, SessionStore};
//! use std::sync::Arc;
//! # use encore_core::{MetadataProvider, Navigator, TrackId};
//! # async fn example(
//! #     provider: Arc<dyn MetadataProvider>,
//! #     navigator: Arc<dyn Navigator>,
//! # ) -> encore_playback::Result<()> {
//! let (session, _task) = SessionController::spawn(SessionParts {
//!     factory: Arc::new(HeadlessFactory::default()),
//!     provider,
//!     store: SessionStore::new(Arc::new(MemoryStore::new())),
//!     navigator,
//!     config: SessionConfig::default(),
//! });
//!
//! session.set_current_track(TrackId::new("yDeAS8Eh"))?;
//! let bar = MiniBar::new(session.clone());
//! session.wait_for(|view| view.is_playing()).await?;
//! println!("{}", bar.render());
//! # Ok(())
//! # }
//! ```

mod controller;
mod engine;
mod error;
mod events;
mod headless;
mod resolver;
mod resource;
pub mod types;
mod view;
mod volume;

// Public exports
pub use controller::{SessionController, SessionHandle, SessionParts};
pub use engine::{AttachSeed, EngineOutcome, PlaybackEngine, PlaybackState};
pub use error::{PlaybackError, ResolutionError, Result};
pub use events::{EventSink, EventTarget, ResourceEvent, TaggedEvent};
pub use headless::{HeadlessConfig, HeadlessFactory, HeadlessResource};
pub use resolver::{select_candidate, Resolution, ResolvedStream, StreamResolver};
pub use resource::{AudioResource, ResourceFactory};
pub use types::{ErrorKind, Notice, PlaybackStatus, PositionSample, SessionConfig};
pub use view::{format_time, ExpandedView, InlineView, MiniBar, SessionViewModel, ViewAdapter};
pub use volume::Volume;
