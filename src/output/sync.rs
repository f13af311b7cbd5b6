//! Output synchronizer - the only owner of the output device
//!
//! Applies transport intent to the device (play, pause, seek, rate) and turns
//! device events for the current stream into [`SyncUpdate`]s for the session.
//! Autoplay priming (start muted on selection, unmute once the real stream is
//! ready) lives here and never shows up as a transport status.

use crate::model::{RepeatMode, StreamLocator};

use super::{DeviceEvent, DeviceEventKind, LoadRequest, OutputDevice, StreamToken};

/// Device feedback that survived stale-event filtering
#[derive(Clone, Debug, PartialEq)]
pub enum SyncUpdate {
    Ready,
    Time(f64),
    Duration(f64),
    Buffered(f64),
    Ended,
    Failed(String),
}

/// What happened at a clean end-of-track
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndOfTrack {
    /// Repeat-one: the device was rewound and restarted.
    Replayed,
    /// The queue should advance.
    Advance,
}

pub struct OutputSynchronizer {
    device: Box<dyn OutputDevice>,
    token: StreamToken,
    loaded: bool,
    /// The device confirmed readiness and `start` ran for this stream.
    started: bool,
    primed: bool,
    /// Seek requested before the stream started; applied by `start`.
    pending_seek: Option<f64>,
    buffered_through: f64,
}

impl OutputSynchronizer {
    pub fn new(device: Box<dyn OutputDevice>) -> Self {
        Self {
            device,
            token: 0,
            loaded: false,
            started: false,
            primed: false,
            pending_seek: None,
            buffered_through: 0.0,
        }
    }

    pub fn token(&self) -> StreamToken {
        self.token
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// A new track was selected: drop the old stream and start muted right
    /// away so the platform keeps granting autoplay.
    pub fn prime(&mut self) {
        self.invalidate();
        self.pending_seek = None;
        self.device.stop();
        self.device.set_muted(true);
        self.device.play();
        self.primed = true;
        tracing::trace!(token = self.token, "Output primed muted");
    }

    /// Hand a fresh locator to the device. Readiness comes back as
    /// [`SyncUpdate::Ready`].
    pub fn load(&mut self, locator: &StreamLocator, expected_duration: f64) -> StreamToken {
        self.invalidate();
        self.loaded = true;
        tracing::debug!(token = self.token, track_id = %locator.track_id, "Loading stream on device");
        self.device
            .load(LoadRequest::new(self.token, locator, expected_duration));
        self.token
    }

    /// The stream is ready: apply the rate and any seek made while loading,
    /// start playback, lift the priming mute.
    pub fn start(&mut self, rate: f64) {
        self.started = true;
        self.device.set_rate(rate);
        if let Some(position) = self.pending_seek.take() {
            self.device.seek(position);
        }
        self.device.play();
        if self.primed {
            self.device.set_muted(false);
            self.primed = false;
        }
    }

    pub fn play(&mut self) {
        if self.loaded {
            self.device.play();
        }
    }

    pub fn pause(&mut self) {
        if self.loaded {
            self.device.pause();
        }
    }

    /// Seek the started stream, or remember the position until it starts.
    pub fn seek(&mut self, position: f64) {
        let position = position.max(0.0);
        if self.started {
            self.device.seek(position);
        } else {
            self.pending_seek = Some(position);
        }
    }

    pub fn set_rate(&mut self, rate: f64) {
        if self.loaded {
            self.device.set_rate(rate);
        }
    }

    /// Stop output and forget the stream; late events for it are ignored.
    pub fn stop(&mut self) {
        self.invalidate();
        self.pending_seek = None;
        self.device.stop();
        if self.primed {
            self.device.set_muted(false);
            self.primed = false;
        }
    }

    /// Filter and translate a device event. Events for anything but the
    /// current stream are dropped.
    pub fn translate(&mut self, event: DeviceEvent) -> Option<SyncUpdate> {
        if event.token != self.token || !self.loaded {
            tracing::trace!(event_token = event.token, token = self.token, "Dropping stale device event");
            return None;
        }
        match event.kind {
            DeviceEventKind::Ready => Some(SyncUpdate::Ready),
            DeviceEventKind::TimeUpdate(t) => Some(SyncUpdate::Time(t)),
            DeviceEventKind::DurationKnown(d) => Some(SyncUpdate::Duration(d)),
            DeviceEventKind::Buffered(t) => {
                if t > self.buffered_through {
                    self.buffered_through = t;
                    Some(SyncUpdate::Buffered(t))
                } else {
                    None
                }
            }
            DeviceEventKind::Ended => Some(SyncUpdate::Ended),
            DeviceEventKind::Error(message) => Some(SyncUpdate::Failed(message)),
        }
    }

    /// Clean end-of-track: repeat-one rewinds and replays in place, anything
    /// else hands control back to the queue.
    pub fn on_track_ended(&mut self, repeat: RepeatMode) -> EndOfTrack {
        if repeat == RepeatMode::One && self.loaded {
            self.device.seek(0.0);
            self.device.play();
            EndOfTrack::Replayed
        } else {
            EndOfTrack::Advance
        }
    }

    fn invalidate(&mut self) {
        self.token += 1;
        self.loaded = false;
        self.started = false;
        self.buffered_through = 0.0;
    }
}
