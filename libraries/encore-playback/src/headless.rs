//! Headless audio resource
//!
//! A clock-driven resource with no output device. Position advances on a
//! tokio interval while playing, so the whole session (events, looping, end
//! of track) behaves as it would with real audio attached.

use crate::error::{PlaybackError, Result};
use crate::events::{EventSink, ResourceEvent};
use crate::resolver::ResolvedStream;
use crate::resource::{AudioResource, ResourceFactory};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Configuration for headless resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessConfig {
    /// Duration used when the stream carries no hint (default: 180)
    pub default_duration_secs: f64,

    /// Clock tick in milliseconds (default: 250)
    pub tick_ms: u64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: 180.0,
            tick_ms: 250,
        }
    }
}

#[derive(Debug)]
struct Clock {
    position: f64,
    duration: f64,
    playing: bool,
    looping: bool,
    gain: f32,
}

impl Clock {
    /// Advance by `step` seconds, returning the event to report
    fn advance(&mut self, step: f64) -> Option<ResourceEvent> {
        if !self.playing {
            return None;
        }

        self.position += step;
        if self.position < self.duration {
            return Some(ResourceEvent::TimeUpdate {
                position_seconds: self.position,
            });
        }

        if self.looping {
            self.position = 0.0;
            Some(ResourceEvent::TimeUpdate {
                position_seconds: 0.0,
            })
        } else {
            self.position = self.duration;
            self.playing = false;
            Some(ResourceEvent::Ended)
        }
    }
}

fn lock(clock: &Mutex<Clock>) -> MutexGuard<'_, Clock> {
    clock.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clock-driven resource without an output device
pub struct HeadlessResource {
    clock: Arc<Mutex<Clock>>,
    sink: EventSink,
    ticker: Option<JoinHandle<()>>,
}

impl HeadlessResource {
    /// Create the resource and start its clock
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(stream: &ResolvedStream, sink: EventSink, config: &HeadlessConfig) -> Self {
        let duration = stream
            .duration_hint
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or_else(|| config.default_duration_secs.max(1.0));

        let clock = Arc::new(Mutex::new(Clock {
            position: 0.0,
            duration,
            playing: false,
            looping: false,
            gain: 1.0,
        }));

        sink.emit(ResourceEvent::Loaded {
            duration_seconds: Some(duration),
        });

        let tick = Duration::from_millis(config.tick_ms.max(1));
        let ticker = tokio::spawn(run_clock(Arc::clone(&clock), sink.clone(), tick));

        debug!(generation = sink.generation(), duration, "Started headless resource");

        Self {
            clock,
            sink,
            ticker: Some(ticker),
        }
    }

    /// Current output gain
    pub fn gain(&self) -> f32 {
        lock(&self.clock).gain
    }
}

async fn run_clock(clock: Arc<Mutex<Clock>>, sink: EventSink, tick: Duration) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let step = tick.as_secs_f64();

    loop {
        interval.tick().await;
        let event = lock(&clock).advance(step);
        if let Some(event) = event {
            if !sink.emit(event) {
                break;
            }
        }
    }
}

impl AudioResource for HeadlessResource {
    fn set_loop(&mut self, looping: bool) {
        lock(&self.clock).looping = looping;
    }

    fn set_volume(&mut self, gain: f32) {
        lock(&self.clock).gain = gain;
    }

    fn seek(&mut self, position_seconds: f64) {
        let mut clock = lock(&self.clock);
        clock.position = position_seconds.clamp(0.0, clock.duration);
    }

    fn request_play(&mut self) {
        {
            let mut clock = lock(&self.clock);
            if clock.position >= clock.duration {
                clock.position = 0.0;
            }
            clock.playing = true;
        }
        self.sink.emit(ResourceEvent::Started);
    }

    fn pause(&mut self) {
        lock(&self.clock).playing = false;
        self.sink.emit(ResourceEvent::Paused);
    }

    fn position(&self) -> f64 {
        lock(&self.clock).position
    }

    fn duration(&self) -> Option<f64> {
        Some(lock(&self.clock).duration)
    }

    fn release(&mut self) {
        lock(&self.clock).playing = false;
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for HeadlessResource {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

/// Factory for [`HeadlessResource`]s
///
/// Only accepts http(s) stream URLs.
#[derive(Debug, Clone, Default)]
pub struct HeadlessFactory {
    config: HeadlessConfig,
}

impl HeadlessFactory {
    pub fn new(config: HeadlessConfig) -> Self {
        Self { config }
    }
}

impl ResourceFactory for HeadlessFactory {
    fn create(&self, stream: &ResolvedStream, sink: EventSink) -> Result<Box<dyn AudioResource>> {
        if !(stream.url.starts_with("https://") || stream.url.starts_with("http://")) {
            return Err(PlaybackError::PlaybackUnsupported(format!(
                "unsupported stream URL: {}",
                stream.url
            )));
        }
        Ok(Box::new(HeadlessResource::start(stream, sink, &self.config)))
    }
}
