/// Track metadata as returned by the lookup service
use super::TrackId;
use serde::{Deserialize, Serialize};

/// One ranked stream location for a track
///
/// Higher `quality_rank` means better quality. `url` may be missing for a
/// rank the service knows about but cannot serve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCandidate {
    pub quality_rank: u32,
    pub url: Option<String>,
}

impl StreamCandidate {
    pub fn new(quality_rank: u32, url: Option<&str>) -> Self {
        Self {
            quality_rank,
            url: url.map(str::to_string),
        }
    }

    /// The URL, treating empty strings as absent
    pub fn playable_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

/// Artwork reference (cover image at one size)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    /// Size label, e.g. "500x500"
    pub quality: String,
    pub url: String,
}

/// Track information for display and stream resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Primary artists, in service order
    pub artists: Vec<String>,

    /// Album name (optional)
    pub album: Option<String>,

    /// Cover images, smallest first
    pub artwork: Vec<Artwork>,

    /// Duration as reported by the service, if any
    pub duration_seconds: Option<f64>,

    /// Ranked stream candidates
    pub stream_candidates: Vec<StreamCandidate>,
}

impl TrackMetadata {
    /// Create metadata with just an id and title
    pub fn new(id: TrackId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            artists: Vec::new(),
            album: None,
            artwork: Vec::new(),
            duration_seconds: None,
            stream_candidates: Vec::new(),
        }
    }

    /// First listed artist, or "unknown"
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map_or("unknown", String::as_str)
    }

    /// Largest artwork (last entry)
    pub fn best_artwork(&self) -> Option<&Artwork> {
        self.artwork.last()
    }
}
