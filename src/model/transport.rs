//! Transport state machine
//!
//! ```text
//! Idle -> Loading -> Playing <-> Paused
//! Loading | Playing | Paused -> Error -> Loading
//! any -> Idle (stop / clear / close)
//! ```
//!
//! All times are in seconds. A duration of 0 means "unknown".

use crate::error::PlaybackError;

use super::types::PlaybackStatus;

pub const MIN_SPEED: f64 = 0.5;
pub const MAX_SPEED: f64 = 2.0;

#[derive(Clone, Debug, PartialEq)]
pub struct TransportState {
    status: PlaybackStatus,
    current_time: f64,
    duration: f64,
    speed: f64,
    buffered: f64,
    error: Option<PlaybackError>,
    /// Paused by `finish`; the device has drained the stream.
    at_end: bool,
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl TransportState {
    pub fn new(speed: f64) -> Self {
        Self {
            status: PlaybackStatus::Idle,
            current_time: 0.0,
            duration: 0.0,
            speed: clamp_speed(speed, 1.0),
            buffered: 0.0,
            error: None,
            at_end: false,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn buffered(&self) -> f64 {
        self.buffered
    }

    pub fn error(&self) -> Option<&PlaybackError> {
        self.error.as_ref()
    }

    /// True while parked at the end of a finished track. Resuming from here
    /// must rewind the device first.
    pub fn is_parked_at_end(&self) -> bool {
        self.at_end
    }

    /// Enter `Loading` for a new track. Allowed from every state; position,
    /// duration, buffering and any previous error are reset.
    pub fn begin_loading(&mut self) {
        tracing::debug!(from = %self.status, "Transport -> Loading");
        self.status = PlaybackStatus::Loading;
        self.current_time = 0.0;
        self.duration = 0.0;
        self.buffered = 0.0;
        self.error = None;
        self.at_end = false;
    }

    /// `Loading -> Playing` once the device confirms it can play.
    pub fn mark_ready(&mut self) -> bool {
        if self.status != PlaybackStatus::Loading {
            return false;
        }
        tracing::debug!("Transport -> Playing");
        self.status = PlaybackStatus::Playing;
        true
    }

    /// `Playing <-> Paused`; no-op from other states. Returns the new status
    /// when it changed.
    pub fn toggle_play_pause(&mut self) -> Option<PlaybackStatus> {
        let next = match self.status {
            PlaybackStatus::Playing => PlaybackStatus::Paused,
            PlaybackStatus::Paused => PlaybackStatus::Playing,
            _ => return None,
        };
        tracing::debug!(from = %self.status, to = %next, "Transport toggled");
        self.status = next;
        Some(next)
    }

    /// Enter `Error` from `Loading`, `Playing` or `Paused`. Returns false (and
    /// drops the error) from any other state.
    pub fn fail(&mut self, error: PlaybackError) -> bool {
        match self.status {
            PlaybackStatus::Loading | PlaybackStatus::Playing | PlaybackStatus::Paused => {
                tracing::debug!(from = %self.status, error = %error, "Transport -> Error");
                self.status = PlaybackStatus::Error;
                self.error = Some(error);
                true
            }
            _ => {
                tracing::debug!(status = %self.status, error = %error, "Ignoring failure outside of active playback");
                false
            }
        }
    }

    /// The device ran out of audio and nothing follows: park at the end.
    pub fn finish(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.status = PlaybackStatus::Paused;
            self.at_end = true;
        }
        if self.duration > 0.0 {
            self.current_time = self.duration;
        }
    }

    /// Back to `Idle` with nothing bound. Speed is a session preference and survives.
    pub fn reset(&mut self) {
        tracing::debug!(from = %self.status, "Transport -> Idle");
        self.status = PlaybackStatus::Idle;
        self.current_time = 0.0;
        self.duration = 0.0;
        self.buffered = 0.0;
        self.error = None;
        self.at_end = false;
    }

    /// Set the playback position, clamped to `[0, duration]` once the duration is known.
    pub fn update_time(&mut self, time: f64) {
        if !time.is_finite() {
            return;
        }
        let mut time = time.max(0.0);
        if self.duration > 0.0 {
            time = time.min(self.duration);
        }
        if time < self.current_time {
            self.at_end = false;
        }
        self.current_time = time;
    }

    pub fn update_duration(&mut self, duration: f64) {
        if !duration.is_finite() || duration < 0.0 {
            return;
        }
        self.duration = duration;
        if duration > 0.0 && self.current_time > duration {
            self.current_time = duration;
        }
    }

    /// Record the buffered-through position; it never moves backwards
    /// within one loaded stream.
    pub fn update_buffered(&mut self, through: f64) {
        if through.is_finite() && through > self.buffered {
            self.buffered = through;
        }
    }

    /// Clamp to `[MIN_SPEED, MAX_SPEED]` and return the applied value.
    pub fn set_speed(&mut self, speed: f64) -> f64 {
        self.speed = clamp_speed(speed, self.speed);
        self.speed
    }
}

fn clamp_speed(speed: f64, fallback: f64) -> f64 {
    if speed.is_nan() {
        fallback
    } else {
        speed.clamp(MIN_SPEED, MAX_SPEED)
    }
}
