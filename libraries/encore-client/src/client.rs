//! Main metadata service client.

use crate::error::{ClientError, Result};
use crate::download::DownloadClient;
use crate::songs::SongsClient;
use crate::types::ApiConfig;
use async_trait::async_trait;
use encore_core::{MetadataProvider, TrackId, TrackMetadata};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Client for the track metadata service.
///
/// Cheap to share behind an `Arc`; the underlying connection pool is reused
/// across lookups.
///
/// # Example
///
/// ```ignore
/// use encore_client::{ApiConfig, MetadataClient};
///
/// let client = MetadataClient::new(ApiConfig::new("https://saavn.example.com"))?;
/// let lyrics = client.songs().get_lyrics(&"yDeAS8Eh".into()).await?;
/// ```
pub struct MetadataClient {
    http: Client,
    base: Url,
}

impl MetadataClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ApiConfig) -> Result<Self> {
        // Validate URL
        if config.url.trim().is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let normalized = config.url.trim().trim_end_matches('/');
        if !normalized.starts_with("http://") && !normalized.starts_with("https://") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let base = Url::parse(normalized).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                normalized
            )));
        }

        // Create HTTP client with reasonable defaults
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Encore/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Request)?;

        debug!(url = %base, "Created metadata client");

        Ok(Self { http, base })
    }

    /// Get the service URL (without trailing slash).
    pub fn url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Song lookups (track, lyrics, suggestions).
    pub fn songs(&self) -> SongsClient<'_> {
        SongsClient::new(&self.http, &self.base)
    }

    /// Media downloads.
    pub fn downloads(&self) -> DownloadClient<'_> {
        DownloadClient::new(&self.http)
    }
}

#[async_trait]
impl MetadataProvider for MetadataClient {
    /// Any non-2xx answer counts as a missing track; transport failures stay errors.
    async fn track(&self, id: &TrackId) -> encore_core::Result<Option<TrackMetadata>> {
        match self.songs().get_track(id).await {
            Ok(track) => Ok(track),
            Err(ClientError::ServerError { status, .. }) => {
                debug!(track_id = %id, status, "Error response, treating track as missing");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
