//! Model module - Session state and data types
//!
//! This module contains the data structures and the pure state machines of a
//! playback session. It is organized into submodules by responsibility:
//!
//! - `types`: Core enums (repeat mode, playback status)
//! - `track`: Track metadata and stream locators
//! - `queue`: Ordered playback queue with shuffle/repeat navigation
//! - `transport`: Transport state machine (status, position, duration, speed)
//! - `snapshot`: Observable state published to the presentation layer

mod types;
mod track;
mod queue;
mod transport;
mod snapshot;

pub use types::{PlaybackStatus, RepeatMode};

pub use track::{Channel, StreamLocator, Track};

pub use queue::{Navigation, PlaybackQueue};

pub use transport::{TransportState, MAX_SPEED, MIN_SPEED};

pub use snapshot::{PlaybackInfo, SessionSnapshot};
