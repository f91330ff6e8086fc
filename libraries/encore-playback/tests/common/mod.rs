//! Shared test doubles for engine and session tests

#![allow(dead_code)]

use async_trait::async_trait;
use encore_core::{MetadataProvider, Navigator, StreamCandidate, TrackId, TrackMetadata};
use encore_playback::{
    AudioResource, EventSink, PlaybackError, ResolvedStream, ResourceEvent, ResourceFactory,
    SessionConfig, SessionController, SessionHandle, SessionParts,
};
use encore_storage::{KeyValueStore, MemoryStore, SessionStore, StorageError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ===== Audio resources =====

/// Everything a mock resource was asked to do
#[derive(Debug)]
struct ResourceLog {
    url: String,
    seeks: Vec<f64>,
    plays: usize,
    pauses: usize,
    gain: f32,
    looping: bool,
    released: bool,
    duration: Option<f64>,
    sink: EventSink,
}

struct MockResource {
    log: Arc<Mutex<ResourceLog>>,
    block_play: bool,
}

impl AudioResource for MockResource {
    fn set_loop(&mut self, looping: bool) {
        self.log.lock().unwrap().looping = looping;
    }

    fn set_volume(&mut self, gain: f32) {
        self.log.lock().unwrap().gain = gain;
    }

    fn seek(&mut self, position_seconds: f64) {
        self.log.lock().unwrap().seeks.push(position_seconds);
    }

    fn request_play(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.plays += 1;
        if self.block_play {
            log.sink
                .emit(ResourceEvent::Blocked("autoplay not allowed".into()));
        } else {
            log.sink.emit(ResourceEvent::Started);
        }
    }

    fn pause(&mut self) {
        self.log.lock().unwrap().pauses += 1;
    }

    fn position(&self) -> f64 {
        self.log.lock().unwrap().seeks.last().copied().unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.log.lock().unwrap().duration
    }

    fn release(&mut self) {
        self.log.lock().unwrap().released = true;
    }
}

/// Factory handing out recorded mock resources
#[derive(Default)]
pub struct MockFactory {
    resources: Mutex<Vec<Arc<Mutex<ResourceLog>>>>,
    block_play: bool,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every play request answers `Blocked`
    pub fn blocking() -> Arc<Self> {
        Arc::new(Self {
            block_play: true,
            ..Self::default()
        })
    }

    pub fn created(&self) -> usize {
        self.resources.lock().unwrap().len()
    }

    /// Resources created and not yet released
    pub fn live(&self) -> usize {
        self.resources
            .lock()
            .unwrap()
            .iter()
            .filter(|r| !r.lock().unwrap().released)
            .count()
    }

    pub fn resource(&self, index: usize) -> Probe {
        Probe(Arc::clone(&self.resources.lock().unwrap()[index]))
    }

    pub fn last(&self) -> Probe {
        let resources = self.resources.lock().unwrap();
        Probe(Arc::clone(resources.last().expect("no resource created")))
    }
}

impl ResourceFactory for MockFactory {
    fn create(
        &self,
        stream: &ResolvedStream,
        sink: EventSink,
    ) -> encore_playback::Result<Box<dyn AudioResource>> {
        if stream.url.contains("unsupported") {
            return Err(PlaybackError::PlaybackUnsupported(stream.url.clone()));
        }

        sink.emit(ResourceEvent::Loaded {
            duration_seconds: stream.duration_hint,
        });
        let log = Arc::new(Mutex::new(ResourceLog {
            url: stream.url.clone(),
            seeks: Vec::new(),
            plays: 0,
            pauses: 0,
            gain: 1.0,
            looping: false,
            released: false,
            duration: stream.duration_hint,
            sink,
        }));
        self.resources.lock().unwrap().push(Arc::clone(&log));

        Ok(Box::new(MockResource {
            log,
            block_play: self.block_play,
        }))
    }
}

/// Read side of a mock resource
pub struct Probe(Arc<Mutex<ResourceLog>>);

impl Probe {
    pub fn url(&self) -> String {
        self.0.lock().unwrap().url.clone()
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.0.lock().unwrap().seeks.clone()
    }

    pub fn plays(&self) -> usize {
        self.0.lock().unwrap().plays
    }

    pub fn pauses(&self) -> usize {
        self.0.lock().unwrap().pauses
    }

    pub fn gain(&self) -> f32 {
        self.0.lock().unwrap().gain
    }

    pub fn looping(&self) -> bool {
        self.0.lock().unwrap().looping
    }

    pub fn released(&self) -> bool {
        self.0.lock().unwrap().released
    }

    /// Emit an event as if the resource produced it
    pub fn emit(&self, event: ResourceEvent) {
        self.0.lock().unwrap().sink.emit(event);
    }
}

// ===== Metadata =====

/// Track with two candidates and a 200 s duration
pub fn track(id: &str) -> TrackMetadata {
    let mut track = TrackMetadata::new(TrackId::new(id), format!("Song {}", id));
    track.artists = vec!["Arijit Singh".to_string()];
    track.duration_seconds = Some(200.0);
    track.stream_candidates = vec![
        StreamCandidate::new(0, Some(&format!("https://cdn/{}/96.mp4", id))),
        StreamCandidate::new(1, Some(&format!("https://cdn/{}/320.mp4", id))),
    ];
    track
}

/// In-memory metadata provider with optional per-track latency
#[derive(Default)]
pub struct StaticProvider {
    tracks: HashMap<String, (TrackMetadata, Duration)>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, track: TrackMetadata) -> Self {
        self.tracks
            .insert(track.id.as_str().to_string(), (track, Duration::ZERO));
        self
    }

    pub fn with_delay(mut self, track: TrackMetadata, delay: Duration) -> Self {
        self.tracks
            .insert(track.id.as_str().to_string(), (track, delay));
        self
    }
}

#[async_trait]
impl MetadataProvider for StaticProvider {
    async fn track(&self, id: &TrackId) -> encore_core::Result<Option<TrackMetadata>> {
        match self.tracks.get(id.as_str()) {
            Some((track, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Ok(Some(track.clone()))
            }
            None => Ok(None),
        }
    }
}

// ===== Navigation =====

#[derive(Default)]
pub struct RecordingNavigator {
    calls: Mutex<Vec<TrackId>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<TrackId> {
        self.calls.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn request_navigate(&self, track: &TrackId) {
        self.calls.lock().unwrap().push(track.clone());
    }
}

// ===== Storage =====

/// Store whose every operation fails
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> encore_storage::Result<Option<String>> {
        Err(StorageError::unavailable("disk gone"))
    }

    fn set(&self, _key: &str, _value: &str) -> encore_storage::Result<()> {
        Err(StorageError::unavailable("disk gone"))
    }

    fn delete(&self, _key: &str) -> encore_storage::Result<()> {
        Err(StorageError::unavailable("disk gone"))
    }
}

/// In-memory store that counts writes per key
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    writes: Mutex<HashMap<String, usize>>,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn writes(&self, key: &str) -> usize {
        self.writes.lock().unwrap().get(key).copied().unwrap_or(0)
    }
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> encore_storage::Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> encore_storage::Result<()> {
        *self.writes.lock().unwrap().entry(key.to_string()).or_default() += 1;
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> encore_storage::Result<()> {
        self.inner.delete(key)
    }
}

pub fn memory_store() -> SessionStore {
    SessionStore::new(Arc::new(MemoryStore::new()))
}

// ===== Session =====

pub struct TestSession {
    pub handle: SessionHandle,
    pub factory: Arc<MockFactory>,
    pub navigator: Arc<RecordingNavigator>,
    pub store: SessionStore,
}

pub fn spawn_session(
    factory: Arc<MockFactory>,
    provider: StaticProvider,
    store: SessionStore,
) -> TestSession {
    let navigator = RecordingNavigator::new();
    let (handle, _task) = SessionController::spawn(SessionParts {
        factory: factory.clone(),
        provider: Arc::new(provider),
        store: store.clone(),
        navigator: navigator.clone(),
        config: SessionConfig::default(),
    });

    TestSession {
        handle,
        factory,
        navigator,
        store,
    }
}
