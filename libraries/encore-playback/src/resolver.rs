//! Stream resolution
//!
//! Turns a track id into the best playable stream URL using the metadata
//! collaborator. One lookup per call, no retries.

use crate::error::ResolutionError;
use encore_core::{MetadataProvider, StreamCandidate, TrackId, TrackMetadata};
use std::sync::Arc;
use tracing::debug;

/// Stream picked for a track
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStream {
    pub url: String,
    pub quality_rank: u32,
    /// Duration reported by the metadata service, if any
    pub duration_hint: Option<f64>,
}

/// Result of a successful resolution
///
/// Carries the metadata so the session does not look the track up twice.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub stream: ResolvedStream,
    pub metadata: TrackMetadata,
}

/// Pick the highest-ranked candidate with a usable URL
///
/// Candidates are visited from highest `quality_rank` to lowest regardless of
/// input order; ties keep input order. Empty URLs count as missing.
pub fn select_candidate(candidates: &[StreamCandidate]) -> Option<&StreamCandidate> {
    let mut ranked: Vec<&StreamCandidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| b.quality_rank.cmp(&a.quality_rank));
    ranked.into_iter().find(|c| c.playable_url().is_some())
}

/// Resolves track ids against a [`MetadataProvider`]
#[derive(Clone)]
pub struct StreamResolver {
    provider: Arc<dyn MetadataProvider>,
}

impl StreamResolver {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self { provider }
    }

    /// Resolve `track_id` to a stream URL
    ///
    /// # Errors
    /// * `EmptyTrackId` - `track_id` is blank
    /// * `NotFound` - the provider has no such track
    /// * `NoPlayableSource` - every candidate URL is missing
    /// * `Lookup` - the provider failed
    pub async fn resolve(&self, track_id: &TrackId) -> Result<Resolution, ResolutionError> {
        if track_id.as_str().trim().is_empty() {
            return Err(ResolutionError::EmptyTrackId);
        }

        let metadata = self
            .provider
            .track(track_id)
            .await?
            .ok_or_else(|| ResolutionError::NotFound(track_id.clone()))?;

        let candidate = select_candidate(&metadata.stream_candidates)
            .ok_or_else(|| ResolutionError::NoPlayableSource(track_id.clone()))?;

        let stream = ResolvedStream {
            url: candidate.playable_url().unwrap_or_default().to_string(),
            quality_rank: candidate.quality_rank,
            duration_hint: metadata.duration_seconds,
        };

        debug!(
            track_id = %track_id,
            quality_rank = stream.quality_rank,
            candidates = metadata.stream_candidates.len(),
            "Resolved stream"
        );

        Ok(Resolution { stream, metadata })
    }
}

impl std::fmt::Debug for StreamResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResolver").finish_non_exhaustive()
    }
}
