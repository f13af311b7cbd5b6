//! Playback session - single-writer actor and its handle
//!
//! All queue, transport and locator state is owned by one task. Callers talk
//! to it through a [`SessionHandle`]: actions go in over a channel, snapshots
//! come out over a `watch` channel.
//!
//! - `actor`: The task that owns and mutates session state
//! - `stream`: Ticketed resolver fetches and the bound stream locator

mod actor;
mod stream;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::error::{ResolveError, SessionClosed};
use crate::model::{RepeatMode, SessionSnapshot, Track};
use crate::output::{DeviceEventReceiver, OutputDevice};
use crate::resolver::TrackResolver;

pub use stream::{FetchCompletion, FetchKind, FetchOutcome, StreamSessionManager, Ticket};

/// Seconds into a track after which "previous" restarts it instead.
pub const RESTART_THRESHOLD_SECS: f64 = 3.0;

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub initial_speed: f64,
    pub restart_threshold: f64,
    /// Fixed seed for shuffle; random when `None`.
    pub shuffle_seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_speed: 1.0,
            restart_threshold: RESTART_THRESHOLD_SECS,
            shuffle_seed: None,
        }
    }
}

/// Everything a caller can ask the session to do
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Resolve metadata for an id, make it the current track and load it.
    Play(String),
    /// Play an already-resolved track outside the queue.
    PlayTrack(Track),
    /// Make queue entry `i` current and load it.
    PlayIndex(usize),
    Enqueue(String),
    EnqueueTrack(Track),
    Remove(usize),
    TogglePlayPause,
    Next,
    Previous,
    Seek(f64),
    SetSpeed(f64),
    SetShuffle(bool),
    SetRepeat(RepeatMode),
    CycleRepeat,
    ToggleLike,
    ClearQueue,
    /// Re-issue the load of the current track after an error.
    Retry,
    Stop,
    Close,
}

/// get-state / dispatch-action / subscribe
pub trait Session {
    fn state(&self) -> SessionSnapshot;
    fn dispatch(&self, action: Action) -> Result<(), SessionClosed>;
    fn subscribe(&self) -> watch::Receiver<SessionSnapshot>;
}

#[derive(Clone)]
pub struct SessionHandle {
    actions: mpsc::UnboundedSender<Action>,
    state: watch::Receiver<SessionSnapshot>,
    resolver: Arc<dyn TrackResolver>,
}

impl SessionHandle {
    /// Spawn the session actor. `device_events` must be the receiving end of
    /// the channel `device` reports on.
    pub fn spawn(
        config: SessionConfig,
        resolver: Arc<dyn TrackResolver>,
        device: Box<dyn OutputDevice>,
        device_events: DeviceEventReceiver,
    ) -> Self {
        let (actions, actions_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(SessionSnapshot::default());

        let actor = actor::SessionActor::new(config, resolver.clone(), device, state_tx);
        tokio::spawn(actor.run(actions_rx, device_events));

        Self {
            actions,
            state,
            resolver,
        }
    }

    pub fn play(&self, track_id: impl Into<String>) -> Result<(), SessionClosed> {
        self.dispatch(Action::Play(track_id.into()))
    }

    pub fn play_track(&self, track: Track) -> Result<(), SessionClosed> {
        self.dispatch(Action::PlayTrack(track))
    }

    pub fn play_index(&self, index: usize) -> Result<(), SessionClosed> {
        self.dispatch(Action::PlayIndex(index))
    }

    pub fn enqueue(&self, track_id: impl Into<String>) -> Result<(), SessionClosed> {
        self.dispatch(Action::Enqueue(track_id.into()))
    }

    pub fn enqueue_track(&self, track: Track) -> Result<(), SessionClosed> {
        self.dispatch(Action::EnqueueTrack(track))
    }

    pub fn remove(&self, index: usize) -> Result<(), SessionClosed> {
        self.dispatch(Action::Remove(index))
    }

    pub fn toggle_play_pause(&self) -> Result<(), SessionClosed> {
        self.dispatch(Action::TogglePlayPause)
    }

    pub fn next(&self) -> Result<(), SessionClosed> {
        self.dispatch(Action::Next)
    }

    pub fn previous(&self) -> Result<(), SessionClosed> {
        self.dispatch(Action::Previous)
    }

    pub fn seek(&self, time: f64) -> Result<(), SessionClosed> {
        self.dispatch(Action::Seek(time))
    }

    pub fn set_speed(&self, speed: f64) -> Result<(), SessionClosed> {
        self.dispatch(Action::SetSpeed(speed))
    }

    pub fn set_shuffle(&self, shuffle: bool) -> Result<(), SessionClosed> {
        self.dispatch(Action::SetShuffle(shuffle))
    }

    pub fn set_repeat(&self, repeat: RepeatMode) -> Result<(), SessionClosed> {
        self.dispatch(Action::SetRepeat(repeat))
    }

    pub fn cycle_repeat(&self) -> Result<(), SessionClosed> {
        self.dispatch(Action::CycleRepeat)
    }

    pub fn toggle_like(&self) -> Result<(), SessionClosed> {
        self.dispatch(Action::ToggleLike)
    }

    pub fn clear_queue(&self) -> Result<(), SessionClosed> {
        self.dispatch(Action::ClearQueue)
    }

    pub fn retry(&self) -> Result<(), SessionClosed> {
        self.dispatch(Action::Retry)
    }

    pub fn stop(&self) -> Result<(), SessionClosed> {
        self.dispatch(Action::Stop)
    }

    /// Stop playback and shut the actor down.
    pub fn close(&self) -> Result<(), SessionClosed> {
        self.dispatch(Action::Close)
    }

    /// Search the provider. Runs outside the actor; session state is untouched.
    pub async fn search(&self, query: &str) -> Result<Vec<Track>, ResolveError> {
        self.resolver.search(query).await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.actions.is_closed()
    }

    /// Resolves once the actor has stopped the device and exited.
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        while state.changed().await.is_ok() {}
    }
}

impl Session for SessionHandle {
    fn state(&self) -> SessionSnapshot {
        self.snapshot()
    }

    fn dispatch(&self, action: Action) -> Result<(), SessionClosed> {
        tracing::trace!(?action, "Dispatching action");
        self.actions.send(action).map_err(|_| SessionClosed)
    }

    fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }
}
