//! Simulated output device
//!
//! Plays nothing; advances a clock at the requested rate and reports the same
//! events a real device would (ready, duration, progress, buffering, end).

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::{DeviceEvent, DeviceEventKind, DeviceEventSender, LoadRequest, OutputDevice, StreamToken};

#[derive(Clone, Debug)]
pub struct SimulatedOptions {
    pub tick: Duration,
    /// Track length used when the load request carries no duration.
    pub default_duration: f64,
    /// How far ahead of the position the "network" has buffered.
    pub buffer_ahead: f64,
    /// Loads whose URL contains this fail with a device error.
    pub fail_urls_containing: Option<String>,
}

impl Default for SimulatedOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(250),
            default_duration: 180.0,
            buffer_ahead: 30.0,
            fail_urls_containing: None,
        }
    }
}

#[derive(Debug)]
enum Command {
    Load(LoadRequest),
    Play,
    Pause,
    Seek(f64),
    Rate(f64),
    Muted(bool),
    Stop,
}

pub struct SimulatedOutput {
    commands: mpsc::UnboundedSender<Command>,
}

impl SimulatedOutput {
    /// Start the clock task. Must be called inside a tokio runtime.
    pub fn spawn(events: DeviceEventSender, options: SimulatedOptions) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_clock(rx, events, options));
        Self { commands }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("Simulated output clock is gone");
        }
    }
}

impl OutputDevice for SimulatedOutput {
    fn load(&mut self, request: LoadRequest) {
        self.send(Command::Load(request));
    }

    fn play(&mut self) {
        self.send(Command::Play);
    }

    fn pause(&mut self) {
        self.send(Command::Pause);
    }

    fn seek(&mut self, position: f64) {
        self.send(Command::Seek(position));
    }

    fn set_rate(&mut self, rate: f64) {
        self.send(Command::Rate(rate));
    }

    fn set_muted(&mut self, muted: bool) {
        self.send(Command::Muted(muted));
    }

    fn stop(&mut self) {
        self.send(Command::Stop);
    }
}

struct Clock {
    events: DeviceEventSender,
    options: SimulatedOptions,
    token: Option<StreamToken>,
    playing: bool,
    ended: bool,
    muted: bool,
    position: f64,
    duration: f64,
    rate: f64,
}

impl Clock {
    fn emit(&self, kind: DeviceEventKind) {
        if let Some(token) = self.token {
            let _ = self.events.send(DeviceEvent::new(token, kind));
        }
    }

    fn buffered(&self) -> f64 {
        (self.position + self.options.buffer_ahead).min(self.duration)
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Load(request) => {
                self.token = Some(request.token);
                self.playing = false;
                self.ended = false;
                self.position = 0.0;
                self.duration = if request.expected_duration > 0.0 {
                    request.expected_duration
                } else {
                    self.options.default_duration
                };

                let fails = self
                    .options
                    .fail_urls_containing
                    .as_deref()
                    .is_some_and(|needle| request.url.contains(needle));
                if fails {
                    self.emit(DeviceEventKind::Error(format!("cannot decode {}", request.url)));
                    self.token = None;
                    return;
                }
                self.emit(DeviceEventKind::DurationKnown(self.duration));
                self.emit(DeviceEventKind::Buffered(self.buffered()));
                self.emit(DeviceEventKind::Ready);
            }
            Command::Play => {
                if self.token.is_some() && !self.ended {
                    self.playing = true;
                }
            }
            Command::Pause => self.playing = false,
            Command::Seek(position) => {
                self.position = position.clamp(0.0, self.duration);
                self.ended = false;
                self.emit(DeviceEventKind::TimeUpdate(self.position));
            }
            Command::Rate(rate) => self.rate = rate,
            Command::Muted(muted) => self.muted = muted,
            Command::Stop => {
                self.token = None;
                self.playing = false;
                self.position = 0.0;
            }
        }
    }

    fn advance(&mut self) {
        if !self.playing || self.token.is_none() {
            return;
        }
        self.position += self.options.tick.as_secs_f64() * self.rate;
        if self.position >= self.duration {
            self.position = self.duration;
            self.playing = false;
            self.ended = true;
            self.emit(DeviceEventKind::TimeUpdate(self.position));
            self.emit(DeviceEventKind::Ended);
        } else {
            self.emit(DeviceEventKind::TimeUpdate(self.position));
            self.emit(DeviceEventKind::Buffered(self.buffered()));
        }
    }
}

async fn run_clock(
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: DeviceEventSender,
    options: SimulatedOptions,
) {
    let mut ticker = tokio::time::interval(options.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut clock = Clock {
        events,
        options,
        token: None,
        playing: false,
        ended: false,
        muted: false,
        position: 0.0,
        duration: 0.0,
        rate: 1.0,
    };

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => clock.handle(command),
                None => break,
            },
            _ = ticker.tick() => clock.advance(),
        }
    }
    tracing::debug!(muted = clock.muted, "Simulated output clock stopped");
}
