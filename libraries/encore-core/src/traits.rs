/// Collaborator traits for Encore
///
/// The playback session consumes these; concrete implementations live in
/// other crates (`encore-client` for HTTP lookup) or in the host application.
use crate::error::Result;
use crate::types::{TrackId, TrackMetadata};
use async_trait::async_trait;

/// Track metadata lookup
///
/// Given a track id, returns title, artists, artwork and the ranked list of
/// stream candidates.
///
/// # Contract
/// * `Ok(Some(track))` - Track exists (candidates may still all be empty)
/// * `Ok(None)` - Lookup succeeded but the service has no such track
/// * `Err(_)` - Transport or protocol failure
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Look up a single track
    async fn track(&self, id: &TrackId) -> Result<Option<TrackMetadata>>;
}

/// Outward navigation request
///
/// Fire-and-forget: the session asks the surrounding application to make
/// `track` the active page. The application decides whether and when it
/// rebinds the session.
pub trait Navigator: Send + Sync {
    /// Request navigation to a track
    fn request_navigate(&self, track: &TrackId);
}

#[async_trait]
impl<T: MetadataProvider + ?Sized> MetadataProvider for std::sync::Arc<T> {
    async fn track(&self, id: &TrackId) -> Result<Option<TrackMetadata>> {
        (**self).track(id).await
    }
}

impl<T: Navigator + ?Sized> Navigator for std::sync::Arc<T> {
    fn request_navigate(&self, track: &TrackId) {
        (**self).request_navigate(track);
    }
}
