//! Error taxonomy for the playback session

use thiserror::Error;

/// Failure reported by a track resolver.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("track not found: {0}")]
    NotFound(String),
    #[error("stream locator expired or unauthorized: {0}")]
    Expired(String),
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),
}

/// Coarse classification the presentation layer can branch on (retry vs. skip).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    MetadataNotFound,
    MetadataProviderError,
    StreamUnavailable,
    DeviceError,
}

/// Error carried by the transport state while in `Error`.
///
/// The `Display` text is the human-readable reason shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("Could not find this track")]
    MetadataNotFound { track_id: String },
    #[error("Could not load track info: {reason}")]
    MetadataProviderError { track_id: String, reason: String },
    #[error("Could not load the stream: {reason}")]
    StreamUnavailable { track_id: String, reason: String },
    #[error("Playback failed: {reason}")]
    DeviceError { reason: String },
}

impl PlaybackError {
    /// Map a metadata lookup failure.
    pub fn from_metadata(track_id: &str, error: ResolveError) -> Self {
        match error {
            ResolveError::NotFound(_) => Self::MetadataNotFound {
                track_id: track_id.to_string(),
            },
            other => Self::MetadataProviderError {
                track_id: track_id.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Map a stream locator failure. Every locator failure is a stream failure,
    /// including `NotFound`.
    pub fn from_locator(track_id: &str, error: ResolveError) -> Self {
        Self::StreamUnavailable {
            track_id: track_id.to_string(),
            reason: error.to_string(),
        }
    }

    pub fn device(reason: impl Into<String>) -> Self {
        Self::DeviceError {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MetadataNotFound { .. } => ErrorKind::MetadataNotFound,
            Self::MetadataProviderError { .. } => ErrorKind::MetadataProviderError,
            Self::StreamUnavailable { .. } => ErrorKind::StreamUnavailable,
            Self::DeviceError { .. } => ErrorKind::DeviceError,
        }
    }

    /// Whether re-issuing the load has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::MetadataNotFound { .. })
    }
}

/// The session actor has shut down and no longer accepts actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("playback session is closed")]
pub struct SessionClosed;
