//! Session actor - the single owner of queue, transport and stream state

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, watch};

use crate::error::{PlaybackError, ResolveError};
use crate::model::{
    Navigation, PlaybackInfo, PlaybackQueue, PlaybackStatus, RepeatMode, SessionSnapshot, Track,
    TransportState,
};
use crate::output::{DeviceEvent, DeviceEventReceiver, EndOfTrack, OutputDevice, OutputSynchronizer, SyncUpdate};
use crate::resolver::TrackResolver;

use super::stream::{FetchCompletion, FetchOutcome, StreamSessionManager};
use super::{Action, SessionConfig};

type Enqueued = (String, Result<Track, ResolveError>);

pub(super) struct SessionActor {
    config: SessionConfig,
    queue: PlaybackQueue,
    transport: TransportState,
    current: Option<Track>,
    shuffle: bool,
    repeat: RepeatMode,
    liked: bool,
    streams: StreamSessionManager,
    output: OutputSynchronizer,
    rng: StdRng,
    state: watch::Sender<SessionSnapshot>,
    completions: mpsc::UnboundedReceiver<FetchCompletion>,
    /// Tracks waiting for metadata before being appended to the queue.
    enqueue_tx: mpsc::UnboundedSender<Enqueued>,
    enqueue_rx: mpsc::UnboundedReceiver<Enqueued>,
    resolver: Arc<dyn TrackResolver>,
}

impl SessionActor {
    pub(super) fn new(
        config: SessionConfig,
        resolver: Arc<dyn TrackResolver>,
        device: Box<dyn OutputDevice>,
        state: watch::Sender<SessionSnapshot>,
    ) -> Self {
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (enqueue_tx, enqueue_rx) = mpsc::unbounded_channel();
        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let actor = Self {
            transport: TransportState::new(config.initial_speed),
            config,
            queue: PlaybackQueue::new(),
            current: None,
            shuffle: false,
            repeat: RepeatMode::Off,
            liked: false,
            streams: StreamSessionManager::new(resolver.clone(), completions_tx),
            output: OutputSynchronizer::new(device),
            rng,
            state,
            completions,
            enqueue_tx,
            enqueue_rx,
            resolver,
        };
        actor.publish();
        actor
    }

    pub(super) async fn run(
        mut self,
        mut actions: mpsc::UnboundedReceiver<Action>,
        mut device_events: DeviceEventReceiver,
    ) {
        tracing::info!("Playback session started");
        loop {
            tokio::select! {
                action = actions.recv() => match action {
                    Some(Action::Close) | None => break,
                    Some(action) => self.handle_action(action),
                },
                Some(completion) = self.completions.recv() => self.handle_completion(completion),
                Some((track_id, result)) = self.enqueue_rx.recv() => self.handle_enqueued(track_id, result),
                Some(event) = device_events.recv() => self.handle_device_event(event),
            }
            self.publish();
        }

        self.stop_playback();
        self.publish();
        tracing::info!("Playback session closed");
    }

    fn handle_action(&mut self, action: Action) {
        tracing::debug!(?action, status = %self.transport.status(), "Handling action");
        match action {
            Action::Play(track_id) => self.load(Track::placeholder(track_id)),
            Action::PlayTrack(track) => self.set_current(track),
            Action::PlayIndex(index) => {
                match self.queue.select(index).cloned() {
                    Some(track) => self.set_current(track),
                    None => tracing::warn!(index, len = self.queue.len(), "Queue index out of range"),
                }
            }
            Action::Enqueue(track_id) => self.enqueue(track_id),
            Action::EnqueueTrack(track) => {
                tracing::info!(track_id = %track.id, "Track enqueued");
                self.queue.enqueue(track);
            }
            Action::Remove(index) => {
                if let Some(track) = self.queue.remove(index) {
                    tracing::info!(track_id = %track.id, index, "Track removed from queue");
                }
            }
            Action::TogglePlayPause => {
                let parked = self.transport.is_parked_at_end();
                match self.transport.toggle_play_pause() {
                    Some(PlaybackStatus::Playing) => {
                        if parked {
                            // The device drained the stream; start it over.
                            self.seek(0.0);
                        }
                        self.output.play();
                    }
                    Some(PlaybackStatus::Paused) => self.output.pause(),
                    _ => {}
                }
            }
            Action::Next => self.next(),
            Action::Previous => self.previous(),
            Action::Seek(time) => self.seek(time),
            Action::SetSpeed(speed) => {
                let applied = self.transport.set_speed(speed);
                self.output.set_rate(applied);
            }
            Action::SetShuffle(shuffle) => self.shuffle = shuffle,
            Action::SetRepeat(repeat) => self.repeat = repeat,
            Action::CycleRepeat => self.repeat = self.repeat.cycle(),
            Action::ToggleLike => {
                if self.current.is_some() {
                    self.liked = !self.liked;
                }
            }
            Action::ClearQueue => {
                self.queue.clear();
                self.stop_playback();
            }
            Action::Retry => self.retry(),
            Action::Stop => self.stop_playback(),
            Action::Close => {}
        }
    }

    // ========================================================================
    // Track changes
    // ========================================================================

    /// Resolve metadata first, then fetch a locator.
    fn load(&mut self, track: Track) {
        let track_id = track.id.clone();
        self.begin_track_change(track);
        self.streams.fetch_metadata(&track_id);
    }

    /// The track is already resolved; fetch a locator right away.
    fn set_current(&mut self, track: Track) {
        let track_id = track.id.clone();
        self.begin_track_change(track);
        self.streams.fetch_locator(&track_id);
    }

    fn begin_track_change(&mut self, track: Track) {
        tracing::info!(track_id = %track.id, title = %track.title, "Current track changed");
        self.queue.set_current(&track);
        self.transport.begin_loading();
        self.transport.update_duration(f64::from(track.duration));
        self.liked = false;
        self.current = Some(track);
        self.output.prime();
    }

    fn next(&mut self) {
        let navigation = self.queue.next(self.shuffle, self.repeat, &mut self.rng);
        self.apply_navigation(navigation);
    }

    fn previous(&mut self) {
        if self.current.is_some() && self.transport.current_time() > self.config.restart_threshold {
            self.seek(0.0);
            return;
        }
        let navigation = self.queue.previous(self.shuffle, self.repeat, &mut self.rng);
        self.apply_navigation(navigation);
    }

    fn apply_navigation(&mut self, navigation: Navigation) -> bool {
        match navigation {
            Navigation::Moved(index) => {
                if let Some(track) = self.queue.get(index).cloned() {
                    self.set_current(track);
                }
                true
            }
            Navigation::Stay => false,
            Navigation::Stop => {
                self.stop_playback();
                true
            }
        }
    }

    fn seek(&mut self, time: f64) {
        if self.current.is_none() || !time.is_finite() {
            return;
        }
        self.transport.update_time(time);
        self.output.seek(self.transport.current_time());
    }

    fn retry(&mut self) {
        if self.transport.status() != PlaybackStatus::Error {
            return;
        }
        if let Some(track) = self.current.clone() {
            tracing::info!(track_id = %track.id, "Retrying after error");
            if track.is_resolved() {
                self.set_current(track);
            } else {
                self.load(track);
            }
        }
    }

    fn stop_playback(&mut self) {
        if self.current.is_some() || self.transport.status().is_active() {
            tracing::info!("Playback stopped");
        }
        self.streams.cancel();
        self.output.stop();
        self.transport.reset();
        self.current = None;
        self.liked = false;
    }

    fn enqueue(&mut self, track_id: String) {
        let resolver = self.resolver.clone();
        let done = self.enqueue_tx.clone();
        tokio::spawn(async move {
            let result = resolver.resolve_metadata(&track_id).await;
            let _ = done.send((track_id, result));
        });
    }

    fn handle_enqueued(&mut self, track_id: String, result: Result<Track, ResolveError>) {
        match result {
            Ok(track) => {
                tracing::info!(track_id = %track.id, "Track enqueued");
                self.queue.enqueue(track);
            }
            // Enqueue failures do not touch the transport; the current track keeps playing.
            Err(e) => tracing::warn!(%track_id, error = %e, "Could not enqueue track"),
        }
    }

    // ========================================================================
    // Fetch completions
    // ========================================================================

    fn handle_completion(&mut self, completion: FetchCompletion) {
        let track_id = completion.track_id.clone();
        let Some(outcome) = self.streams.accept(completion) else {
            return;
        };

        match outcome {
            FetchOutcome::Metadata(Ok(track)) => {
                self.queue.set_current(&track);
                self.transport.update_duration(f64::from(track.duration));
                self.current = Some(track);
                self.streams.fetch_locator(&track_id);
            }
            FetchOutcome::Metadata(Err(e)) => {
                self.fail(PlaybackError::from_metadata(&track_id, e));
            }
            FetchOutcome::Locator(Ok(locator)) => {
                tracing::debug!(%track_id, age_secs = locator.age_secs(), "Stream locator bound");
                self.output.load(&locator, self.transport.duration());
            }
            FetchOutcome::Locator(Err(e)) => {
                self.fail(PlaybackError::from_locator(&track_id, e));
            }
        }
    }

    fn fail(&mut self, error: PlaybackError) {
        tracing::warn!(error = %error, kind = ?error.kind(), "Playback error");
        if self.transport.fail(error) {
            self.streams.cancel();
            self.output.stop();
        }
    }

    // ========================================================================
    // Device events
    // ========================================================================

    fn handle_device_event(&mut self, event: DeviceEvent) {
        let Some(update) = self.output.translate(event) else {
            return;
        };
        match update {
            SyncUpdate::Ready => {
                if self.transport.mark_ready() {
                    self.output.start(self.transport.speed());
                }
            }
            SyncUpdate::Time(time) => self.transport.update_time(time),
            SyncUpdate::Duration(duration) => self.transport.update_duration(duration),
            SyncUpdate::Buffered(through) => self.transport.update_buffered(through),
            SyncUpdate::Ended => self.on_track_ended(),
            SyncUpdate::Failed(reason) => {
                tracing::error!(%reason, "Output device failed");
                self.fail(PlaybackError::device(reason));
            }
        }
    }

    fn on_track_ended(&mut self) {
        tracing::debug!(track_id = ?self.current.as_ref().map(|t| &t.id), repeat = %self.repeat, "End of track");
        match self.output.on_track_ended(self.repeat) {
            EndOfTrack::Replayed => self.transport.update_time(0.0),
            EndOfTrack::Advance => {
                let navigation = self.queue.next(self.shuffle, self.repeat, &mut self.rng);
                if navigation == Navigation::Stay && self.repeat == RepeatMode::All {
                    // A one-track queue under repeat-all loops in place.
                    self.output.seek(0.0);
                    self.output.play();
                    self.transport.update_time(0.0);
                } else if !self.apply_navigation(navigation) {
                    self.transport.finish();
                }
            }
        }
    }

    fn publish(&self) {
        let snapshot = SessionSnapshot {
            track: self.current.clone(),
            playback: PlaybackInfo {
                current_time: self.transport.current_time(),
                duration: self.transport.duration(),
                speed: self.transport.speed(),
                buffered: self.transport.buffered(),
            },
            status: self.transport.status(),
            error: self.transport.error().cloned(),
            shuffle: self.shuffle,
            repeat: self.repeat,
            liked: self.liked,
            queue: self.queue.tracks().to_vec(),
            current_index: self.queue.current_index(),
        };
        self.state.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
