//! Domain types for Encore

mod ids;
mod track;

pub use ids::TrackId;
pub use track::{Artwork, StreamCandidate, TrackMetadata};
