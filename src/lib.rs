//! tubeplay - ad-free audio playback for video-hosting entries
//!
//! The library is organized by responsibility:
//!
//! - `model`: Value types and the pure queue / transport state machines
//! - `resolver`: Track resolver contract, retry policy and the Piped HTTP client
//! - `output`: Output device contract, synchronizer and concrete devices
//! - `session`: The single-writer session actor and its handle
//! - `error`: Error taxonomy surfaced to the presentation layer
//! - `config` / `logging`: Ambient application setup

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod output;
pub mod resolver;
pub mod session;

pub use error::{ErrorKind, PlaybackError, ResolveError, SessionClosed};
pub use model::{
    PlaybackQueue, PlaybackStatus, RepeatMode, SessionSnapshot, StreamLocator, Track,
    TransportState,
};
pub use session::{Action, Session, SessionConfig, SessionHandle};
