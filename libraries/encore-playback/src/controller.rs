//! Session controller
//!
//! A single tokio task owns the [`PlaybackEngine`]. Commands from
//! [`SessionHandle`]s, resource events and finished stream resolutions all go
//! through one inbox and are processed strictly in arrival order; the two
//! timers (seek coalescing, position persistence) run alongside. After each
//! message the task publishes one [`SessionViewModel`] that every observer
//! shares.

use crate::engine::{AttachSeed, EngineOutcome, PlaybackEngine};
use crate::error::{PlaybackError, ResolutionError, Result};
use crate::events::{EventTarget, TaggedEvent};
use crate::resolver::{Resolution, StreamResolver};
use crate::resource::ResourceFactory;
use crate::types::{ErrorKind, Notice, PlaybackStatus, PositionSample, SessionConfig};
use crate::view::SessionViewModel;
use encore_core::{MetadataProvider, Navigator, TrackId, TrackMetadata};
use encore_storage::{PersistedSession, SessionPatch, SessionStore};
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Commands sent to the session task
#[derive(Debug)]
pub(crate) enum Command {
    SetCurrentTrack(TrackId),
    Play,
    Pause,
    TogglePlayPause,
    Seek(f64),
    SetLoop(bool),
    ToggleLoop,
    SetVolume(f32),
    Mute,
    Unmute,
    ToggleMute,
    Expand,
    Collapse,
    ToggleLike,
    SetNextTrack(Option<TrackId>),
    DismissNotice,
    Clear,
    Snapshot(oneshot::Sender<Arc<SessionViewModel>>),
    Shutdown,
}

/// Everything the session task processes in order
#[derive(Debug)]
pub(crate) enum Message {
    Command(Command),
    Resource(TaggedEvent),
    Resolved(u64, std::result::Result<Resolution, ResolutionError>),
}

/// Delivers resource events into the session inbox
///
/// Holds a weak sender so the session still stops once every handle is gone.
struct Inbox(mpsc::WeakUnboundedSender<Message>);

impl Inbox {
    fn send(&self, message: Message) -> bool {
        self.0
            .upgrade()
            .map_or(false, |tx| tx.send(message).is_ok())
    }
}

impl EventTarget for Inbox {
    fn deliver(&self, event: TaggedEvent) -> bool {
        self.send(Message::Resource(event))
    }
}

/// Collaborators of a playback session
pub struct SessionParts {
    pub factory: Arc<dyn ResourceFactory>,
    pub provider: Arc<dyn MetadataProvider>,
    pub store: SessionStore,
    pub navigator: Arc<dyn Navigator>,
    pub config: SessionConfig,
}

/// The session task
pub struct SessionController {
    engine: PlaybackEngine,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
    config: SessionConfig,

    inbox: mpsc::UnboundedReceiver<Message>,
    inbox_tx: mpsc::WeakUnboundedSender<Message>,
    view_tx: watch::Sender<Arc<SessionViewModel>>,

    metadata: Option<TrackMetadata>,
    next_track: Option<TrackId>,
    play_intent: bool,
    expanded: bool,
    liked: bool,
    notice: Option<Notice>,
    /// Generation for which navigation was already requested
    navigated_for: Option<u64>,
    last_persist: Option<Instant>,
    /// Position waiting for the next throttled write
    unsaved_position: Option<f64>,
}

impl SessionController {
    /// Create the controller and a handle to it
    ///
    /// Loop and volume are seeded from the persisted session so observers see
    /// them before any track is attached.
    pub fn new(parts: SessionParts) -> (Self, SessionHandle) {
        let SessionParts {
            factory,
            provider,
            store,
            navigator,
            config,
        } = parts;

        let (commands, inbox) = mpsc::unbounded_channel();
        let inbox_tx = commands.downgrade();

        let resolver = StreamResolver::new(provider);
        let mut engine = PlaybackEngine::with_event_target(
            factory,
            resolver,
            config.clone(),
            Arc::new(Inbox(inbox_tx.clone())),
        );

        let persisted = load_persisted(&store);
        if let Some(ref persisted) = persisted {
            engine.set_volume(persisted.volume);
            engine.set_loop(persisted.looping);
        }

        let (view_tx, view_rx) = watch::channel(Arc::new(SessionViewModel::default()));

        let mut controller = Self {
            engine,
            store,
            navigator,
            config,
            inbox,
            inbox_tx,
            view_tx,
            metadata: None,
            next_track: None,
            play_intent: persisted.map_or(true, |p| p.play_intent),
            expanded: false,
            liked: false,
            notice: None,
            navigated_for: None,
            last_persist: None,
            unsaved_position: None,
        };
        controller.publish();

        let handle = SessionHandle {
            commands,
            view: view_rx,
        };
        (controller, handle)
    }

    /// Create the controller and run it on a new task
    pub fn spawn(parts: SessionParts) -> (SessionHandle, JoinHandle<()>) {
        let (controller, handle) = Self::new(parts);
        let task = tokio::spawn(controller.run());
        (handle, task)
    }

    /// Process messages until shut down or every handle is dropped
    pub async fn run(mut self) {
        let mut positions = Box::pin(self.engine.position_stream());

        loop {
            let seek_deadline = self.engine.seek_deadline();
            let flush_at = seek_deadline.unwrap_or_else(Instant::now);
            let save_deadline = self.save_deadline();
            let save_at = save_deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                biased;

                message = self.inbox.recv() => match message {
                    Some(Message::Command(Command::Shutdown)) | None => break,
                    Some(Message::Command(command)) => self.handle_command(command),
                    Some(Message::Resource(event)) => self.on_resource_event(event),
                    Some(Message::Resolved(generation, resolution)) => {
                        self.on_resolution(generation, resolution);
                    }
                },
                () = tokio::time::sleep_until(flush_at), if seek_deadline.is_some() => {
                    if let Some(position) = self.engine.flush_seek() {
                        self.persist_position(position);
                    }
                }
                () = tokio::time::sleep_until(save_at), if save_deadline.is_some() => {
                    if let Some(position) = self.unsaved_position.take() {
                        self.save_position(position, Instant::now());
                    }
                }
                Some(sample) = positions.next() => self.on_position(sample),
            }

            self.publish();
        }

        self.engine.release();
        self.publish();
        info!("Playback session stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SetCurrentTrack(track_id) => self.set_current_track(track_id),
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::TogglePlayPause => {
                if self.engine.state().status == PlaybackStatus::Playing {
                    self.pause();
                } else {
                    self.play();
                }
            }
            Command::Seek(position) => match self.engine.seek(position) {
                // Without a coalescing window the seek is already applied
                Ok(position) if self.engine.seek_deadline().is_none() => {
                    self.persist_position(position);
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "Ignoring seek"),
            },
            Command::SetLoop(looping) => self.set_loop(looping),
            Command::ToggleLoop => self.set_loop(!self.engine.state().looping),
            Command::SetVolume(level) => {
                let level = self.engine.set_volume(level);
                self.persist(SessionPatch::new().volume(level));
            }
            Command::Mute => self.change_mute(PlaybackEngine::mute),
            Command::Unmute => self.change_mute(PlaybackEngine::unmute),
            Command::ToggleMute => self.change_mute(PlaybackEngine::toggle_mute),
            Command::Expand => self.expanded = true,
            Command::Collapse => self.expanded = false,
            Command::ToggleLike => self.toggle_like(),
            Command::SetNextTrack(next) => {
                debug!(next = ?next.as_ref().map(TrackId::as_str), "Next track set");
                self.next_track = next;
            }
            Command::DismissNotice => self.notice = None,
            Command::Clear => self.clear(),
            Command::Snapshot(reply) => {
                self.publish();
                let _ = reply.send(self.view_tx.borrow().clone());
            }
            // Handled by the run loop
            Command::Shutdown => {}
        }
    }

    // ===== Track binding =====

    fn set_current_track(&mut self, track_id: TrackId) {
        if track_id.as_str().trim().is_empty() {
            self.show_error(&PlaybackError::Resolution(ResolutionError::EmptyTrackId));
            return;
        }

        let state = self.engine.state();
        if state.track_id.as_ref() == Some(&track_id)
            && !matches!(state.status, PlaybackStatus::Idle | PlaybackStatus::Errored)
        {
            debug!(track_id = %track_id, "Track already attached");
            return;
        }

        let persisted = load_persisted(&self.store);
        let seed = AttachSeed {
            position_seconds: persisted
                .as_ref()
                .filter(|p| p.last_played == track_id)
                .map_or(0.0, |p| p.position_seconds),
            looping: persisted
                .as_ref()
                .map_or(self.engine.state().looping, |p| p.looping),
            volume: persisted
                .as_ref()
                .map_or(self.engine.state().volume.level(), |p| p.volume),
        };
        self.play_intent = persisted.as_ref().map_or(true, |p| p.play_intent);

        // A position saved for another track must not follow the new one
        let mut patch = SessionPatch::new().last_played(track_id.clone());
        if persisted.as_ref().map_or(true, |p| p.last_played != track_id) {
            patch = patch.position(0.0);
        }
        self.persist(patch);

        self.metadata = None;
        self.next_track = None;
        self.notice = None;
        self.navigated_for = None;
        self.last_persist = None;
        self.unsaved_position = None;
        self.liked = self.store.is_liked(&track_id).unwrap_or_else(|e| {
            warn!(error = %e, "Could not read liked flag");
            false
        });

        let generation = self.engine.begin_attach(track_id.clone(), seed);

        let resolver = self.engine.resolver();
        let inbox = Inbox(self.inbox_tx.clone());
        tokio::spawn(async move {
            let resolution = resolver.resolve(&track_id).await;
            // The session may have stopped meanwhile
            inbox.send(Message::Resolved(generation, resolution));
        });
    }

    fn on_resolution(
        &mut self,
        generation: u64,
        resolution: std::result::Result<Resolution, ResolutionError>,
    ) {
        match self.engine.complete_attach(generation, resolution) {
            Ok(metadata) => {
                info!(
                    track_id = %metadata.id,
                    title = %metadata.title,
                    "Track ready"
                );
                self.metadata = Some(metadata);
                if self.play_intent {
                    self.start_playback();
                }
            }
            Err(PlaybackError::Superseded) => {}
            Err(e) => self.show_error(&e),
        }
    }

    // ===== Transport =====

    fn play(&mut self) {
        self.set_play_intent(true);
        self.start_playback();
    }

    fn start_playback(&mut self) {
        match self.engine.play() {
            Ok(()) => {}
            // Loading: the intent is applied once the resource exists
            Err(PlaybackError::NoTrackLoaded) => debug!("Play requested before a resource exists"),
            Err(e) => self.show_error(&e),
        }
    }

    fn pause(&mut self) {
        self.set_play_intent(false);
        let was_playing = self.engine.state().status == PlaybackStatus::Playing;
        match self.engine.pause() {
            Ok(()) if was_playing => {
                let position = self.engine.state().clamped_position();
                self.save_position(position, Instant::now());
            }
            Ok(()) => {}
            Err(e) => debug!(error = %e, "Ignoring pause"),
        }
    }

    fn set_play_intent(&mut self, playing: bool) {
        if self.play_intent != playing {
            self.play_intent = playing;
            self.persist(SessionPatch::new().play_intent(playing));
        }
    }

    /// Apply a mute change and persist the level if unmuting restored one
    fn change_mute(&mut self, apply: fn(&mut PlaybackEngine)) {
        let before = self.engine.state().volume.level();
        apply(&mut self.engine);
        let after = self.engine.state().volume.level();
        if after != before {
            self.persist(SessionPatch::new().volume(after));
        }
    }

    fn set_loop(&mut self, looping: bool) {
        self.engine.set_loop(looping);
        self.persist(SessionPatch::new().looping(looping));
    }

    fn toggle_like(&mut self) {
        let Some(track_id) = self.engine.state().track_id.clone() else {
            debug!("Nothing to like");
            return;
        };
        match self.store.toggle_liked(&track_id) {
            Ok(liked) => self.liked = liked,
            Err(e) => self.persistence_unavailable(e.into()),
        }
    }

    fn clear(&mut self) {
        self.engine.release();
        if let Err(e) = self.store.clear() {
            self.persistence_unavailable(e.into());
        }

        self.metadata = None;
        self.next_track = None;
        self.notice = None;
        self.expanded = false;
        self.liked = false;
        self.play_intent = true;
        self.navigated_for = None;
        self.last_persist = None;
        self.unsaved_position = None;
        info!("Session cleared");
    }

    // ===== Resource events =====

    fn on_resource_event(&mut self, event: TaggedEvent) {
        let Some(outcome) = self.engine.handle_event(event) else {
            return;
        };

        match outcome {
            EngineOutcome::Updated => {}
            EngineOutcome::Looped => self.save_position(0.0, Instant::now()),
            EngineOutcome::Ended => {
                let position = self.engine.state().clamped_position();
                self.save_position(position, Instant::now());
                self.on_ended();
            }
            EngineOutcome::Blocked(reason) => {
                self.notice = Some(Notice::new(ErrorKind::PlaybackBlocked, reason));
            }
            EngineOutcome::Failed(message) => {
                self.notice = Some(Notice::new(ErrorKind::PlaybackFailure, message));
            }
        }
    }

    fn on_ended(&mut self) {
        let generation = self.engine.generation();
        if self.navigated_for == Some(generation) {
            return;
        }

        if let Some(next) = self.next_track.clone() {
            self.navigated_for = Some(generation);
            info!(next = %next, "Track ended, requesting navigation");
            self.navigator.request_navigate(&next);
        } else {
            debug!("Track ended with no next track");
        }
    }

    fn on_position(&mut self, sample: PositionSample) {
        let now = Instant::now();
        if !self.persist_due(now) {
            return;
        }

        let position = match sample.duration_seconds {
            Some(duration) => sample.position_seconds.min(duration),
            None => sample.position_seconds,
        };
        self.save_position(position, now);
    }

    // ===== Position persistence =====

    fn persist_due(&self, now: Instant) -> bool {
        self.last_persist
            .map_or(true, |last| now.duration_since(last) >= self.config.persist_interval())
    }

    /// When the held-back position is written
    fn save_deadline(&self) -> Option<Instant> {
        self.unsaved_position?;
        Some(
            self.last_persist
                .map_or_else(Instant::now, |last| last + self.config.persist_interval()),
        )
    }

    /// Write `position` unless a write happened within the persist interval
    ///
    /// A skipped position is kept and written once the interval has passed.
    fn persist_position(&mut self, position: f64) {
        let now = Instant::now();
        if self.persist_due(now) {
            self.save_position(position, now);
        } else {
            self.unsaved_position = Some(position);
        }
    }

    /// Write `position` now, replacing any held-back one
    fn save_position(&mut self, position: f64, now: Instant) {
        self.unsaved_position = None;
        self.last_persist = Some(now);
        self.persist(SessionPatch::new().position(position));
    }

    // ===== Errors and persistence =====

    fn show_error(&mut self, error: &PlaybackError) {
        match error.kind() {
            Some(ErrorKind::PersistenceUnavailable) | None => {
                debug!(error = %error, "Not surfacing error");
            }
            Some(kind) => {
                warn!(error = %error, "Playback error");
                self.notice = Some(Notice::new(kind, error.to_string()));
            }
        }
    }

    fn persist(&self, patch: SessionPatch) {
        if let Err(e) = self.store.save(&patch) {
            self.persistence_unavailable(e.into());
        }
    }

    fn persistence_unavailable(&self, error: PlaybackError) {
        warn!(error = %error, "Session store unavailable, continuing without it");
    }

    // ===== View model =====

    fn publish(&mut self) {
        let state = self.engine.state();
        let next = SessionViewModel {
            track_id: state.track_id.clone(),
            metadata: self.metadata.clone(),
            status: state.status,
            position_seconds: state.position_seconds,
            duration_seconds: state.duration_seconds,
            looping: state.looping,
            volume: state.volume.level(),
            muted: state.volume.is_muted(),
            liked: self.liked,
            expanded: self.expanded,
            next_track: self.next_track.clone(),
            notice: self.notice.clone(),
        };

        self.view_tx.send_if_modified(|current| {
            if **current == next {
                false
            } else {
                *current = Arc::new(next);
                true
            }
        });
    }
}

fn load_persisted(store: &SessionStore) -> Option<PersistedSession> {
    store.load().unwrap_or_else(|e| {
        warn!(error = %PlaybackError::from(e), "Session store unavailable, using defaults");
        None
    })
}

/// Clonable handle to a running session
///
/// Commands are queued and processed in the order they were sent. The
/// current view model can be read at any time without a round trip.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Message>,
    view: watch::Receiver<Arc<SessionViewModel>>,
}

impl SessionHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(Message::Command(command))
            .map_err(|_| PlaybackError::SessionClosed)
    }

    /// Bind a track to the session
    pub fn set_current_track(&self, track_id: TrackId) -> Result<()> {
        self.send(Command::SetCurrentTrack(track_id))
    }

    pub fn play(&self) -> Result<()> {
        self.send(Command::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.send(Command::TogglePlayPause)
    }

    pub fn seek(&self, position_seconds: f64) -> Result<()> {
        self.send(Command::Seek(position_seconds))
    }

    pub fn set_loop(&self, looping: bool) -> Result<()> {
        self.send(Command::SetLoop(looping))
    }

    pub fn toggle_loop(&self) -> Result<()> {
        self.send(Command::ToggleLoop)
    }

    /// Set volume (0.0-1.0, clamped)
    pub fn set_volume(&self, level: f32) -> Result<()> {
        self.send(Command::SetVolume(level))
    }

    pub fn mute(&self) -> Result<()> {
        self.send(Command::Mute)
    }

    pub fn unmute(&self) -> Result<()> {
        self.send(Command::Unmute)
    }

    pub fn toggle_mute(&self) -> Result<()> {
        self.send(Command::ToggleMute)
    }

    pub fn expand(&self) -> Result<()> {
        self.send(Command::Expand)
    }

    pub fn collapse(&self) -> Result<()> {
        self.send(Command::Collapse)
    }

    /// Flip the liked flag of the current track
    pub fn toggle_like(&self) -> Result<()> {
        self.send(Command::ToggleLike)
    }

    /// Track to navigate to when the current one ends
    pub fn set_next_track(&self, next: Option<TrackId>) -> Result<()> {
        self.send(Command::SetNextTrack(next))
    }

    pub fn dismiss_notice(&self) -> Result<()> {
        self.send(Command::DismissNotice)
    }

    /// Release the resource and delete the persisted session
    pub fn clear(&self) -> Result<()> {
        self.send(Command::Clear)
    }

    /// Stop the session task
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// View model after every previously sent command was processed
    pub async fn snapshot(&self) -> Result<Arc<SessionViewModel>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| PlaybackError::SessionClosed)
    }

    /// Latest published view model
    pub fn current(&self) -> Arc<SessionViewModel> {
        self.view.borrow().clone()
    }

    /// New receiver for view model changes
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionViewModel>> {
        self.view.clone()
    }

    /// Wait until the view model satisfies `predicate`
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<Arc<SessionViewModel>>
    where
        F: FnMut(&SessionViewModel) -> bool,
    {
        let mut rx = self.view.clone();
        let view = rx
            .wait_for(|view| predicate(view))
            .await
            .map_err(|_| PlaybackError::SessionClosed)?;
        Ok(Arc::clone(&view))
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("closed", &self.commands.is_closed())
            .finish_non_exhaustive()
    }
}
