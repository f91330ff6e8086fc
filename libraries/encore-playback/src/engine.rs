//! Playback engine
//!
//! Owns the single live audio resource and the transient playback state.
//! Everything here is synchronous except [`PlaybackEngine::attach`], which is
//! a convenience over the three attach phases:
//!
//! 1. [`begin_attach`](PlaybackEngine::begin_attach) releases the old resource,
//!    bumps the attachment generation and enters `Loading`
//! 2. the caller resolves the stream (see [`StreamResolver`])
//! 3. [`complete_attach`](PlaybackEngine::complete_attach) wires the new
//!    resource, unless a newer attach has started in the meantime
//!
//! Resource callbacks arrive as [`TaggedEvent`]s and are fed back through
//! [`handle_event`](PlaybackEngine::handle_event). Events whose generation is
//! not the live one are dropped.

use crate::error::{PlaybackError, ResolutionError, Result};
use crate::events::{EventSink, EventTarget, ResourceEvent, TaggedEvent};
use crate::resolver::{Resolution, StreamResolver};
use crate::resource::{AudioResource, ResourceFactory};
use crate::types::{ErrorKind, PlaybackStatus, PositionSample, SessionConfig};
use crate::volume::Volume;
use encore_core::{TrackId, TrackMetadata};
use futures_util::Stream;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Initial values applied when a track is attached
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachSeed {
    /// Restored position; 0 starts from the beginning
    pub position_seconds: f64,
    pub looping: bool,
    pub volume: f32,
}

impl Default for AttachSeed {
    fn default() -> Self {
        Self {
            position_seconds: 0.0,
            looping: false,
            volume: 1.0,
        }
    }
}

/// Transient state of the attached track
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub track_id: Option<TrackId>,
    pub status: PlaybackStatus,
    pub position_seconds: f64,
    pub duration_seconds: Option<f64>,
    pub looping: bool,
    pub volume: Volume,
    pub last_error: Option<ErrorKind>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            track_id: None,
            status: PlaybackStatus::Idle,
            position_seconds: 0.0,
            duration_seconds: None,
            looping: false,
            volume: Volume::default(),
            last_error: None,
        }
    }
}

impl PlaybackState {
    /// Clamp a position to `[0, duration]`
    fn clamp_position(&self, position: f64) -> f64 {
        let position = if position.is_finite() {
            position.max(0.0)
        } else {
            0.0
        };
        match self.duration_seconds {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    /// Current position clamped to `[0, duration]`
    pub fn clamped_position(&self) -> f64 {
        self.clamp_position(self.position_seconds)
    }

    fn sample(&self) -> PositionSample {
        PositionSample {
            position_seconds: self.position_seconds,
            duration_seconds: self.duration_seconds,
        }
    }
}

/// What an applied resource event means for the session
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutcome {
    /// State changed, nothing else to do
    Updated,
    /// Track ended without looping
    Ended,
    /// Track ended and restarted from 0
    Looped,
    /// A play request was refused
    Blocked(String),
    /// Resource fault; the engine is now `Errored`
    Failed(String),
}

#[derive(Debug, Clone, Copy)]
struct PendingAttach {
    generation: u64,
    seed_position: f64,
}

#[derive(Debug, Clone, Copy)]
struct PendingSeek {
    position: f64,
    deadline: Instant,
}

/// Published to position streams
#[derive(Debug, Clone, Copy, Default)]
struct Tick {
    playing: bool,
    sample: PositionSample,
}

/// Playback engine
pub struct PlaybackEngine {
    factory: Arc<dyn ResourceFactory>,
    resolver: StreamResolver,
    config: SessionConfig,
    events: Arc<dyn EventTarget>,
    resource: Option<Box<dyn AudioResource>>,
    generation: u64,
    state: PlaybackState,
    pending_attach: Option<PendingAttach>,
    pending_seek: Option<PendingSeek>,
    play_requested: bool,
    ticks: watch::Sender<Tick>,
}

impl PlaybackEngine {
    /// Create an engine delivering resource events to a channel
    ///
    /// Returns the receiver all resource events arrive on; the owner must
    /// pass them to [`handle_event`](Self::handle_event) in order.
    pub fn new(
        factory: Arc<dyn ResourceFactory>,
        resolver: StreamResolver,
        config: SessionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<TaggedEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let engine = Self::with_event_target(factory, resolver, config, Arc::new(events_tx));
        (engine, events_rx)
    }

    /// Create an engine delivering resource events to `events`
    pub fn with_event_target(
        factory: Arc<dyn ResourceFactory>,
        resolver: StreamResolver,
        config: SessionConfig,
        events: Arc<dyn EventTarget>,
    ) -> Self {
        let (ticks, _) = watch::channel(Tick::default());

        let state = PlaybackState {
            volume: Volume::new(config.initial_volume),
            ..PlaybackState::default()
        };

        Self {
            factory,
            resolver,
            config,
            events,
            resource: None,
            generation: 0,
            state,
            pending_attach: None,
            pending_seek: None,
            play_requested: false,
            ticks,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Live attachment generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_resource(&self) -> bool {
        self.resource.is_some()
    }

    /// Resolver for running phase 2 of an attach elsewhere
    pub fn resolver(&self) -> StreamResolver {
        self.resolver.clone()
    }

    // ===== Attach =====

    /// Resolve and attach `track_id` in one go
    ///
    /// # Errors
    /// `Resolution` or `PlaybackUnsupported`; `Superseded` if another attach
    /// began while resolving.
    pub async fn attach(&mut self, track_id: TrackId, seed: AttachSeed) -> Result<TrackMetadata> {
        let generation = self.begin_attach(track_id.clone(), seed);
        let resolution = self.resolver.resolve(&track_id).await;
        self.complete_attach(generation, resolution)
    }

    /// Release the current resource and enter `Loading` for `track_id`
    ///
    /// Returns the new attachment generation.
    pub fn begin_attach(&mut self, track_id: TrackId, seed: AttachSeed) -> u64 {
        self.release_resource();
        self.generation += 1;

        let mut volume = self.state.volume;
        volume.set_level(seed.volume);

        self.state = PlaybackState {
            track_id: Some(track_id.clone()),
            status: PlaybackStatus::Loading,
            position_seconds: 0.0,
            duration_seconds: None,
            looping: seed.looping,
            volume,
            last_error: None,
        };
        self.pending_attach = Some(PendingAttach {
            generation: self.generation,
            seed_position: seed.position_seconds,
        });
        self.pending_seek = None;
        self.play_requested = false;
        self.publish_tick();

        info!(track_id = %track_id, generation = self.generation, "Attaching track");
        self.generation
    }

    /// Wire the resource for a finished resolution
    ///
    /// # Errors
    /// `Superseded` when `generation` is no longer the pending attach (state
    /// is left untouched). Resolution and factory errors leave the engine
    /// `Errored`.
    pub fn complete_attach(
        &mut self,
        generation: u64,
        resolution: std::result::Result<Resolution, ResolutionError>,
    ) -> Result<TrackMetadata> {
        let pending = match self.pending_attach {
            Some(pending) if pending.generation == generation => pending,
            _ => {
                debug!(
                    generation,
                    live = self.generation,
                    "Discarding stale resolution"
                );
                return Err(PlaybackError::Superseded);
            }
        };
        self.pending_attach = None;

        let resolution = match resolution {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(error = %e, "Stream resolution failed");
                self.fail(ErrorKind::Resolution);
                return Err(e.into());
            }
        };

        let sink = EventSink::new(generation, Arc::clone(&self.events));
        let mut resource = match self.factory.create(&resolution.stream, sink) {
            Ok(resource) => resource,
            Err(e) => {
                error!(error = %e, url = %resolution.stream.url, "Failed to create audio resource");
                self.fail(e.kind().unwrap_or(ErrorKind::PlaybackUnsupported));
                return Err(e);
            }
        };

        resource.set_loop(self.state.looping);
        resource.set_volume(self.state.volume.gain());

        self.state.duration_seconds = resource
            .duration()
            .or(resolution.stream.duration_hint)
            .filter(|d| d.is_finite() && *d > 0.0);
        self.state.status = PlaybackStatus::Ready;

        if pending.seed_position > 0.0 {
            let target = self
                .state
                .clamp_position(pending.seed_position + self.config.resume_offset_secs);
            resource.seek(target);
            self.state.position_seconds = target;
            debug!(seed = pending.seed_position, target, "Restored position");
        }

        self.resource = Some(resource);
        self.publish_tick();
        Ok(resolution.metadata)
    }

    // ===== Transport =====

    /// Start or resume playback
    ///
    /// The resource answers asynchronously; status becomes `Playing` when
    /// `Started` arrives. From a non-looping `Ended`, restarts at 0.
    ///
    /// # Errors
    /// `NoTrackLoaded` without a resource, `PlaybackFailure` when `Errored`.
    pub fn play(&mut self) -> Result<()> {
        if self.state.status == PlaybackStatus::Errored {
            return Err(PlaybackError::PlaybackFailure(
                "track failed; attach it again".into(),
            ));
        }
        let resource = self.resource.as_mut().ok_or(PlaybackError::NoTrackLoaded)?;

        match self.state.status {
            PlaybackStatus::Playing => return Ok(()),
            PlaybackStatus::Ended => {
                resource.seek(0.0);
                self.state.position_seconds = 0.0;
                self.state.status = PlaybackStatus::Ready;
                self.pending_seek = None;
            }
            _ => {}
        }

        self.play_requested = true;
        resource.request_play();
        self.publish_tick();
        Ok(())
    }

    /// Pause playback
    ///
    /// Pausing an already paused, ended or errored track does nothing.
    pub fn pause(&mut self) -> Result<()> {
        let resource = self.resource.as_mut().ok_or(PlaybackError::NoTrackLoaded)?;
        self.play_requested = false;

        match self.state.status {
            PlaybackStatus::Paused | PlaybackStatus::Ended | PlaybackStatus::Errored => Ok(()),
            _ => {
                resource.pause();
                self.state.status = PlaybackStatus::Paused;
                self.publish_tick();
                Ok(())
            }
        }
    }

    /// Seek to `position_seconds`
    ///
    /// Clamps to `[0, duration]`. The reported position changes at once; the
    /// resource only sees the last position requested within the coalescing
    /// window, applied by [`flush_seek`](Self::flush_seek).
    pub fn seek(&mut self, position_seconds: f64) -> Result<f64> {
        if self.resource.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }

        let position = self.state.clamp_position(position_seconds);
        self.state.position_seconds = position;
        if self.state.status == PlaybackStatus::Ended
            && self.state.duration_seconds.map_or(true, |d| position < d)
        {
            self.state.status = PlaybackStatus::Paused;
        }

        let deadline = match self.pending_seek {
            Some(pending) => pending.deadline,
            None => Instant::now() + self.config.seek_coalesce(),
        };
        self.pending_seek = Some(PendingSeek { position, deadline });

        if self.config.seek_coalesce_ms == 0 {
            self.flush_seek();
        }
        self.publish_tick();
        Ok(position)
    }

    /// When the pending seek must be applied, if any
    pub fn seek_deadline(&self) -> Option<Instant> {
        self.pending_seek.map(|pending| pending.deadline)
    }

    /// Apply the pending seek to the resource
    ///
    /// Returns the applied position.
    pub fn flush_seek(&mut self) -> Option<f64> {
        let pending = self.pending_seek.take()?;
        let resource = self.resource.as_mut()?;
        resource.seek(pending.position);
        debug!(position = pending.position, "Applied seek");
        Some(pending.position)
    }

    /// Apply the pending seek if its deadline has passed
    pub fn flush_seek_if_due(&mut self, now: Instant) -> Option<f64> {
        match self.seek_deadline() {
            Some(deadline) if deadline <= now => self.flush_seek(),
            _ => None,
        }
    }

    // ===== Volume and loop =====

    pub fn set_volume(&mut self, level: f32) -> f32 {
        self.state.volume.set_level(level);
        self.apply_gain();
        self.state.volume.level()
    }

    pub fn mute(&mut self) {
        self.state.volume.mute();
        self.apply_gain();
    }

    pub fn unmute(&mut self) {
        self.state.volume.unmute();
        self.apply_gain();
    }

    pub fn toggle_mute(&mut self) {
        self.state.volume.toggle_mute();
        self.apply_gain();
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.state.looping = looping;
        if let Some(resource) = self.resource.as_mut() {
            resource.set_loop(looping);
        }
    }

    fn apply_gain(&mut self) {
        let gain = self.state.volume.gain();
        if let Some(resource) = self.resource.as_mut() {
            resource.set_volume(gain);
        }
    }

    // ===== Events =====

    /// Apply a resource event
    ///
    /// Returns `None` for events from a released resource.
    pub fn handle_event(&mut self, tagged: TaggedEvent) -> Option<EngineOutcome> {
        if tagged.generation != self.generation || self.resource.is_none() {
            debug!(
                generation = tagged.generation,
                live = self.generation,
                event = ?tagged.event,
                "Dropping stale resource event"
            );
            return None;
        }

        let outcome = match tagged.event {
            ResourceEvent::Loaded { duration_seconds } => {
                if let Some(duration) = duration_seconds.filter(|d| d.is_finite() && *d > 0.0) {
                    self.state.duration_seconds = Some(duration);
                    self.state.position_seconds =
                        self.state.clamp_position(self.state.position_seconds);
                }
                EngineOutcome::Updated
            }
            ResourceEvent::TimeUpdate { position_seconds } => {
                // The reported position already reflects a pending seek
                if self.pending_seek.is_none() && !self.state.status.is_terminal() {
                    self.state.position_seconds = self.state.clamp_position(position_seconds);
                }
                EngineOutcome::Updated
            }
            ResourceEvent::Started => {
                if self.play_requested && !self.state.status.is_terminal() {
                    self.state.status = PlaybackStatus::Playing;
                    self.state.last_error = None;
                } else {
                    debug!(status = %self.state.status, "Ignoring unrequested start");
                }
                EngineOutcome::Updated
            }
            ResourceEvent::Paused => {
                if self.state.status == PlaybackStatus::Playing {
                    self.state.status = PlaybackStatus::Paused;
                }
                EngineOutcome::Updated
            }
            ResourceEvent::Ended => self.on_ended(),
            ResourceEvent::Blocked(reason) => {
                self.play_requested = false;
                if matches!(
                    self.state.status,
                    PlaybackStatus::Ready | PlaybackStatus::Playing
                ) {
                    self.state.status = PlaybackStatus::Paused;
                }
                self.state.last_error = Some(ErrorKind::PlaybackBlocked);
                warn!(reason = %reason, "Playback blocked");
                EngineOutcome::Blocked(reason)
            }
            ResourceEvent::Error(message) => {
                error!(error = %message, "Audio resource failed");
                if let Some(resource) = self.resource.as_mut() {
                    resource.pause();
                }
                self.fail(ErrorKind::PlaybackFailure);
                EngineOutcome::Failed(message)
            }
        };

        self.publish_tick();
        Some(outcome)
    }

    fn on_ended(&mut self) -> EngineOutcome {
        if self.state.status.is_terminal() {
            return EngineOutcome::Updated;
        }

        if self.state.looping {
            if let Some(resource) = self.resource.as_mut() {
                resource.seek(0.0);
                resource.request_play();
            }
            self.pending_seek = None;
            self.play_requested = true;
            self.state.position_seconds = 0.0;
            self.state.status = PlaybackStatus::Playing;
            debug!("Looping track");
            EngineOutcome::Looped
        } else {
            self.play_requested = false;
            if let Some(duration) = self.state.duration_seconds {
                self.state.position_seconds = duration;
            }
            self.state.status = PlaybackStatus::Ended;
            EngineOutcome::Ended
        }
    }

    fn fail(&mut self, kind: ErrorKind) {
        self.play_requested = false;
        self.pending_seek = None;
        self.state.status = PlaybackStatus::Errored;
        self.state.last_error = Some(kind);
        self.publish_tick();
    }

    // ===== Teardown =====

    /// Release the resource and return to `Idle`
    ///
    /// Loop and volume survive; any in-flight attach becomes stale.
    pub fn release(&mut self) {
        self.release_resource();
        self.generation += 1;
        self.pending_attach = None;
        self.pending_seek = None;
        self.play_requested = false;
        self.state = PlaybackState {
            looping: self.state.looping,
            volume: self.state.volume,
            ..PlaybackState::default()
        };
        self.publish_tick();
    }

    fn release_resource(&mut self) {
        if let Some(mut resource) = self.resource.take() {
            resource.release();
            debug!(generation = self.generation, "Released audio resource");
        }
    }

    // ===== Position stream =====

    /// Throttled position samples
    ///
    /// Yields at most one sample per configured interval while playing and
    /// nothing otherwise. Each call returns an independent stream; it ends
    /// only when the engine is dropped.
    pub fn position_stream(&self) -> impl Stream<Item = PositionSample> + Send + 'static {
        let rx = self.ticks.subscribe();
        let period = self.config.position_interval();

        futures_util::stream::unfold(
            (rx, None::<Interval>),
            move |(mut rx, interval)| async move {
                let mut interval = interval.unwrap_or_else(|| {
                    let mut interval = tokio::time::interval(period);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    interval
                });

                loop {
                    if !rx.borrow_and_update().playing {
                        rx.changed().await.ok()?;
                        interval.reset();
                        continue;
                    }

                    interval.tick().await;
                    let tick = *rx.borrow();
                    if tick.playing {
                        return Some((tick.sample, (rx, Some(interval))));
                    }
                }
            },
        )
    }

    fn publish_tick(&self) {
        self.ticks.send_replace(Tick {
            playing: self.state.status == PlaybackStatus::Playing,
            sample: self.state.sample(),
        });
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.release_resource();
    }
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("generation", &self.generation)
            .field("state", &self.state)
            .field("has_resource", &self.resource.is_some())
            .finish_non_exhaustive()
    }
}
