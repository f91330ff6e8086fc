/// ID types for Encore entities
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Track identifier
///
/// Opaque id issued by the metadata service. Never empty when built through
/// [`TrackId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Create a new track ID without validation
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a track ID, rejecting empty or whitespace-only input
    pub fn parse(id: impl AsRef<str>) -> Result<Self> {
        let trimmed = id.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoreError::invalid_input("track id cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is empty (only possible through [`TrackId::new`])
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::str::FromStr for TrackId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
