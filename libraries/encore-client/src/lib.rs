//! Encore Metadata Client
//!
//! HTTP client for the track metadata service that backs the playback
//! session.
//!
//! # Features
//!
//! - **Track lookup**: title, artists, artwork and ranked stream candidates
//! - **Lyrics**: plain-text lyrics for a track
//! - **Suggestions**: related tracks, used to pick a "next" track
//! - **Downloads**: stream a resolved media file to disk
//!
//! [`MetadataClient`] implements [`encore_core::MetadataProvider`], so it can
//! be handed straight to the stream resolver.
//!
//! # Example
//!
//! ```ignore
//! use encore_client::{ApiConfig, MetadataClient};
//! use encore_core::TrackId;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MetadataClient::new(ApiConfig::new("https://saavn.example.com"))?;
//!
//!     if let Some(track) = client.songs().get_track(&TrackId::new("yDeAS8Eh")).await? {
//!         println!("{} by {}", track.title, track.primary_artist());
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod download;
mod error;
mod songs;
mod types;

pub use client::MetadataClient;
pub use download::DownloadClient;
pub use error::{ClientError, Result};
pub use songs::SongsClient;
pub use types::{ApiConfig, DownloadProgress, Lyrics};
