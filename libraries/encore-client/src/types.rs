//! Types for metadata service requests and responses.

use encore_core::{Artwork, StreamCandidate, TrackId, TrackMetadata};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for connecting to the metadata service.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the service (e.g., "https://saavn.example.com")
    pub url: String,
    /// Total request timeout
    pub timeout: Duration,
}

impl ApiConfig {
    /// Create a new config with just the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// Standard response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
}

/// A song as returned by the service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireSong {
    pub id: String,
    pub name: String,
    /// Seconds; some responses send it as a string
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub duration: Option<f64>,
    #[serde(default)]
    pub album: Option<WireAlbum>,
    #[serde(default)]
    pub artists: Option<WireArtists>,
    #[serde(default)]
    pub image: Vec<WireLink>,
    /// Stream URLs, lowest quality first
    #[serde(default)]
    pub download_url: Vec<WireLink>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct WireAlbum {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct WireArtists {
    #[serde(default)]
    pub primary: Vec<WireArtist>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct WireArtist {
    pub name: String,
}

/// Quality-labelled link (images and stream URLs share this shape).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct WireLink {
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireLyrics {
    pub lyrics: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
}

/// Progress of a running download.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    pub bytes_received: u64,
    /// From `Content-Length`, when the server sends one
    pub bytes_total: Option<u64>,
    /// 0.0-1.0, or 0.0 when the total is unknown
    pub progress: f32,
}

/// Lyrics for a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lyrics {
    pub text: String,
    pub copyright: Option<String>,
}

impl WireLyrics {
    /// Blank lyrics count as missing
    pub(crate) fn into_lyrics(self) -> Option<Lyrics> {
        let text = self.lyrics.filter(|l| !l.trim().is_empty())?;
        Some(Lyrics {
            text,
            copyright: self.copyright,
        })
    }
}

impl From<WireSong> for TrackMetadata {
    fn from(song: WireSong) -> Self {
        // Position in `downloadUrl` is the quality rank: later entries are better
        let stream_candidates = song
            .download_url
            .into_iter()
            .enumerate()
            .map(|(rank, link)| StreamCandidate {
                quality_rank: rank as u32,
                url: link.url,
            })
            .collect();

        let artwork = song
            .image
            .into_iter()
            .filter_map(|link| {
                Some(Artwork {
                    quality: link.quality.unwrap_or_default(),
                    url: link.url?,
                })
            })
            .collect();

        TrackMetadata {
            id: TrackId::new(song.id),
            title: song.name,
            artists: song
                .artists
                .map(|a| a.primary.into_iter().map(|artist| artist.name).collect())
                .unwrap_or_default(),
            album: song.album.and_then(|a| a.name),
            artwork,
            duration_seconds: song.duration,
            stream_candidates,
        }
    }
}

fn lenient_seconds<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|d: &f64| d.is_finite() && *d > 0.0))
}
