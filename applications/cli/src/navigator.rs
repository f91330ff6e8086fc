//! Navigation requests routed back to the player loop

use encore_core::{Navigator, TrackId};
use tokio::sync::mpsc;
use tracing::debug;

/// Forwards navigation requests over a channel
///
/// The CLI has a single "page", so navigating means rebinding the session
/// to the requested track.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<TrackId>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TrackId>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn request_navigate(&self, track: &TrackId) {
        debug!(track_id = %track, "Navigation requested");
        // Receiver gone means the player is shutting down
        let _ = self.tx.send(track.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwards_requests_in_order() {
        let (navigator, mut rx) = ChannelNavigator::new();
        navigator.request_navigate(&TrackId::new("a"));
        navigator.request_navigate(&TrackId::new("b"));

        assert_eq!(rx.try_recv().unwrap(), TrackId::new("a"));
        assert_eq!(rx.try_recv().unwrap(), TrackId::new("b"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_receiver_is_ignored() {
        let (navigator, rx) = ChannelNavigator::new();
        drop(rx);
        navigator.request_navigate(&TrackId::new("a"));
    }
}
