//! Audio resource abstraction
//!
//! The engine never decodes audio itself. A [`ResourceFactory`] turns a
//! resolved stream into an [`AudioResource`], which is driven through
//! synchronous calls and answers through its [`EventSink`].

use crate::error::Result;
use crate::events::EventSink;
use crate::resolver::ResolvedStream;

/// One attached audio stream
///
/// Exactly one resource is live per session. Calls must not block: outcomes
/// that take time (play start, buffering) are reported as events.
pub trait AudioResource: Send {
    /// Restart from 0 at the end instead of ending
    fn set_loop(&mut self, looping: bool);

    /// Output gain, 0.0-1.0
    fn set_volume(&mut self, gain: f32);

    /// Jump to `position_seconds`
    fn seek(&mut self, position_seconds: f64);

    /// Ask to start playing
    ///
    /// Answered by `Started` or `Blocked`.
    fn request_play(&mut self);

    fn pause(&mut self);

    /// Current position in seconds
    fn position(&self) -> f64;

    /// Total duration, if known
    fn duration(&self) -> Option<f64>;

    /// Detach from the output and stop emitting events
    fn release(&mut self);
}

/// Creates audio resources for resolved streams
pub trait ResourceFactory: Send + Sync {
    /// Create a resource for `stream`
    ///
    /// # Errors
    /// `PlaybackUnsupported` when the stream cannot be played by this backend.
    fn create(&self, stream: &ResolvedStream, sink: EventSink) -> Result<Box<dyn AudioResource>>;
}

impl<T: ResourceFactory + ?Sized> ResourceFactory for std::sync::Arc<T> {
    fn create(&self, stream: &ResolvedStream, sink: EventSink) -> Result<Box<dyn AudioResource>> {
        (**self).create(stream, sink)
    }
}
