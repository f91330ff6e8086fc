//! Encore Core
//!
//! Platform-agnostic core types, collaborator traits, and error handling for Encore.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `TrackId`, `TrackMetadata`, `StreamCandidate`
//! - **Collaborator Traits**: `MetadataProvider` (track lookup), `Navigator` (page changes)
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use encore_core::{StreamCandidate, TrackId, TrackMetadata};
//!
//! let id = TrackId::parse("yDeAS8Eh").unwrap();
//! let mut track = TrackMetadata::new(id, "Song");
//! track.stream_candidates = vec![
//!     StreamCandidate::new(0, Some("https://cdn.example.com/96.mp4")),
//!     StreamCandidate::new(1, None),
//! ];
//! assert_eq!(track.stream_candidates.len(), 2);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use traits::{MetadataProvider, Navigator};
pub use types::{Artwork, StreamCandidate, TrackId, TrackMetadata};
