//! Song lookups against the metadata service.

use crate::error::{ClientError, Result};
use crate::types::{Envelope, Lyrics, WireLyrics, WireSong};
use encore_core::{TrackId, TrackMetadata};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// Song client for the metadata service.
pub struct SongsClient<'a> {
    http: &'a Client,
    base: &'a Url,
}

impl<'a> SongsClient<'a> {
    pub(crate) fn new(http: &'a Client, base: &'a Url) -> Self {
        Self { http, base }
    }

    /// Get a single track by ID.
    ///
    /// Returns `Ok(None)` when the service answers 404 or an empty result.
    pub async fn get_track(&self, track_id: &TrackId) -> Result<Option<TrackMetadata>> {
        let url = self.endpoint(&["api", "songs", track_id.as_str()])?;
        debug!(url = %url, track_id = %track_id, "Fetching track");

        let Some(songs) = self.fetch::<Vec<WireSong>>(url).await? else {
            return Ok(None);
        };

        let track = songs.into_iter().next().map(TrackMetadata::from);
        debug!(
            track_id = %track_id,
            found = track.is_some(),
            candidates = track.as_ref().map_or(0, |t| t.stream_candidates.len()),
            "Fetched track"
        );
        Ok(track)
    }

    /// Get lyrics for a track.
    ///
    /// Returns `Ok(None)` when the service has no lyrics for it.
    pub async fn get_lyrics(&self, track_id: &TrackId) -> Result<Option<Lyrics>> {
        let url = self.endpoint(&["api", "songs", track_id.as_str(), "lyrics"])?;
        debug!(url = %url, track_id = %track_id, "Fetching lyrics");

        Ok(self
            .fetch::<WireLyrics>(url)
            .await?
            .and_then(WireLyrics::into_lyrics))
    }

    /// Get tracks related to `track_id`.
    pub async fn get_suggestions(
        &self,
        track_id: &TrackId,
        limit: usize,
    ) -> Result<Vec<TrackMetadata>> {
        let mut url = self.endpoint(&["api", "songs", track_id.as_str(), "suggestions"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        debug!(url = %url, track_id = %track_id, "Fetching suggestions");

        let songs = self.fetch::<Vec<WireSong>>(url).await?.unwrap_or_default();
        Ok(songs
            .into_iter()
            .map(TrackMetadata::from)
            .filter(|t| &t.id != track_id)
            .collect())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `url` and unwrap the response envelope.
    ///
    /// 404 and `success: false` both map to `Ok(None)`.
    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ClientError::ServerUnreachable(e.to_string())
            } else {
                ClientError::Request(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(server_error(response).await);
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            ClientError::ParseError(format!("Failed to parse response: {}", e))
        })?;

        if envelope.success {
            Ok(envelope.data)
        } else {
            Ok(None)
        }
    }
}

async fn server_error(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    ClientError::ServerError { status, message }
}
