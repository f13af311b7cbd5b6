//! Observable session state

use crate::error::PlaybackError;

use super::track::Track;
use super::types::{PlaybackStatus, RepeatMode};

/// Timing part of the snapshot, all in seconds
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackInfo {
    pub current_time: f64,
    pub duration: f64,
    pub speed: f64,
    pub buffered: f64,
}

impl Default for PlaybackInfo {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            speed: 1.0,
            buffered: 0.0,
        }
    }
}

impl PlaybackInfo {
    /// Progress through the track in `[0, 1]`; 0 while the duration is unknown.
    pub fn progress_ratio(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Complete session state for rendering the UI
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionSnapshot {
    pub track: Option<Track>,
    pub playback: PlaybackInfo,
    pub status: PlaybackStatus,
    pub error: Option<PlaybackError>,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub liked: bool,
    pub queue: Vec<Track>,
    pub current_index: Option<usize>,
}

impl SessionSnapshot {
    pub fn track_id(&self) -> Option<&str> {
        self.track.as_ref().map(|t| t.id.as_str())
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }
}
