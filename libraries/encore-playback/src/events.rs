//! Resource events
//!
//! Audio resources report what happened to them through an [`EventSink`].
//! Every event is tagged with the attachment generation the resource was
//! created for, so the engine can drop events from a resource it already
//! released.

use std::sync::Arc;
use tokio::sync::mpsc;

/// Events emitted by an audio resource
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    /// Stream metadata is known
    Loaded {
        /// Total duration, if the resource could probe it
        duration_seconds: Option<f64>,
    },

    /// Playback position moved
    TimeUpdate { position_seconds: f64 },

    /// A requested play actually started
    Started,

    /// Resource paused on its own (stall, device lost)
    Paused,

    /// Reached the end of the stream
    Ended,

    /// A requested play was refused
    Blocked(String),

    /// Decode or network fault
    Error(String),
}

/// Resource event with the generation of the resource that sent it
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedEvent {
    pub generation: u64,
    pub event: ResourceEvent,
}

/// Where tagged events are delivered
///
/// Implemented for a plain channel sender; the session controller provides
/// its own so resource events share one queue with commands.
pub trait EventTarget: Send + Sync {
    /// Deliver an event, returning `false` once nobody is listening
    fn deliver(&self, event: TaggedEvent) -> bool;
}

impl EventTarget for mpsc::UnboundedSender<TaggedEvent> {
    fn deliver(&self, event: TaggedEvent) -> bool {
        self.send(event).is_ok()
    }
}

/// Sending half handed to each audio resource
#[derive(Clone)]
pub struct EventSink {
    generation: u64,
    target: Arc<dyn EventTarget>,
}

impl EventSink {
    pub fn new(generation: u64, target: Arc<dyn EventTarget>) -> Self {
        Self { generation, target }
    }

    /// Generation this sink tags events with
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Emit an event
    ///
    /// Returns `false` once the session has gone away.
    pub fn emit(&self, event: ResourceEvent) -> bool {
        self.target.deliver(TaggedEvent {
            generation: self.generation,
            event,
        })
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
