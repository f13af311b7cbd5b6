//! Track metadata and stream locators

use chrono::{DateTime, Utc};

/// The channel that published a track
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub thumbnail: String,
}

/// A playable audio item, immutable once fetched.
///
/// `duration` is in whole seconds and is 0 until resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub duration: u32,
    pub channel: Channel,
    pub thumbnail: String,
}

impl Track {
    /// A track referenced only by id, before its metadata is resolved.
    pub fn placeholder(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            duration: 0,
            channel: Channel::default(),
            thumbnail: String::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.duration > 0 || self.title != self.id
    }
}

/// Short-lived URL authorizing direct retrieval of one track's audio bytes.
///
/// Never reused across tracks and never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamLocator {
    pub track_id: String,
    pub url: String,
    pub mime_type: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl StreamLocator {
    pub fn new(track_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            track_id: track_id.into(),
            url: url.into(),
            mime_type: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn is_for(&self, track_id: &str) -> bool {
        self.track_id == track_id
    }

    /// Seconds since the provider handed out this locator.
    pub fn age_secs(&self) -> i64 {
        (Utc::now() - self.fetched_at).num_seconds()
    }
}
