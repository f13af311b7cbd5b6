//! Output devices and the synchronizer that owns them
//!
//! - `sync`: Translates transport intent into device calls and device events back
//! - `simulated`: Clock-driven device for headless runs and tests
//! - `rodio_output`: Real audio output (feature `rodio-output`)

mod simulated;
mod sync;
#[cfg(feature = "rodio-output")]
mod rodio_output;

use tokio::sync::mpsc;

use crate::model::StreamLocator;

pub use simulated::{SimulatedOptions, SimulatedOutput};
pub use sync::{EndOfTrack, OutputSynchronizer, SyncUpdate};
#[cfg(feature = "rodio-output")]
pub use rodio_output::RodioOutput;

/// Identifies one loaded stream. Events tagged with an older token are stale.
pub type StreamToken = u64;

pub type DeviceEventSender = mpsc::UnboundedSender<DeviceEvent>;
pub type DeviceEventReceiver = mpsc::UnboundedReceiver<DeviceEvent>;

pub fn device_channel() -> (DeviceEventSender, DeviceEventReceiver) {
    mpsc::unbounded_channel()
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeviceEventKind {
    /// The loaded stream can start playing.
    Ready,
    TimeUpdate(f64),
    DurationKnown(f64),
    /// Audio is available up to this position.
    Buffered(f64),
    Ended,
    Error(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeviceEvent {
    pub token: StreamToken,
    pub kind: DeviceEventKind,
}

impl DeviceEvent {
    pub fn new(token: StreamToken, kind: DeviceEventKind) -> Self {
        Self { token, kind }
    }
}

/// What the device needs to open a stream.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadRequest {
    pub token: StreamToken,
    pub url: String,
    pub mime_type: Option<String>,
    /// Duration from metadata in seconds, 0 if unknown.
    pub expected_duration: f64,
}

impl LoadRequest {
    pub fn new(token: StreamToken, locator: &StreamLocator, expected_duration: f64) -> Self {
        Self {
            token,
            url: locator.url.clone(),
            mime_type: locator.mime_type.clone(),
            expected_duration,
        }
    }
}

/// A concrete audio output. Calls are fire-and-forget; outcomes come back as
/// [`DeviceEvent`]s on the channel the device was created with.
pub trait OutputDevice: Send {
    fn load(&mut self, request: LoadRequest);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, position: f64);
    fn set_rate(&mut self, rate: f64);
    fn set_muted(&mut self, muted: bool);
    fn stop(&mut self);
}
