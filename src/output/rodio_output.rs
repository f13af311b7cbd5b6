//! Real audio output through rodio
//!
//! The rodio output stream is not `Send`, so it lives on a dedicated thread
//! that receives commands over a std channel. Locators are downloaded into
//! memory on the tokio runtime and handed back to the audio thread.

use std::io::Cursor;
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::{DeviceEvent, DeviceEventKind, DeviceEventSender, LoadRequest, OutputDevice, StreamToken};

const TICK: Duration = Duration::from_millis(250);

enum Command {
    Load(LoadRequest),
    Downloaded { token: StreamToken, bytes: Vec<u8> },
    DownloadFailed { token: StreamToken, reason: String },
    Play,
    Pause,
    Seek(f64),
    Rate(f64),
    Muted(bool),
    Stop,
}

pub struct RodioOutput {
    commands: std_mpsc::Sender<Command>,
}

impl RodioOutput {
    /// Open the default output device on a dedicated thread.
    pub fn spawn(events: DeviceEventSender, runtime: tokio::runtime::Handle) -> Result<Self> {
        let (commands, rx) = std_mpsc::channel();
        let (opened_tx, opened_rx) = std_mpsc::channel::<Result<(), String>>();
        let downloads = commands.clone();

        thread::Builder::new()
            .name("tubeplay-audio".into())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => {
                        let _ = opened_tx.send(Ok(()));
                        pair
                    }
                    Err(e) => {
                        let _ = opened_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                AudioThread::new(handle, events, downloads, runtime).run(rx);
            })
            .context("Failed to spawn audio thread")?;

        opened_rx
            .recv()
            .context("Audio thread exited before opening the device")?
            .map_err(|e| anyhow!("Failed to open audio output: {e}"))?;

        tracing::info!("Rodio audio output opened");
        Ok(Self { commands })
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("Audio thread is gone");
        }
    }
}

impl OutputDevice for RodioOutput {
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

struct AudioThread {
    handle: OutputStreamHandle,
    events: DeviceEventSender,
    downloads: std_mpsc::Sender<Command>,
    runtime: tokio::runtime::Handle,
    sink: Option<Sink>,
    token: Option<StreamToken>,
    bytes: Option<Vec<u8>>,
    playing: bool,
    muted: bool,
    rate: f64,
    ended_sent: bool,
}

impl AudioThread {
    fn new(
        handle: OutputStreamHandle,
        events: DeviceEventSender,
        downloads: std_mpsc::Sender<Command>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        Self {
            handle,
            events,
            downloads,
            runtime,
            sink: None,
            token: None,
            bytes: None,
            playing: false,
            muted: false,
            rate: 1.0,
            ended_sent: false,
        }
    }

    fn run(mut self, commands: std_mpsc::Receiver<Command>) {
        let mut last_tick = Instant::now();
        loop {
            match commands.recv_timeout(TICK) {
                Ok(command) => self.handle(command),
                Err(std_mpsc::RecvTimeoutError::Timeout) => {}
                Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
            }
            if last_tick.elapsed() >= TICK {
                last_tick = Instant::now();
                self.tick();
            }
        }
        tracing::debug!("Audio thread stopped");
    }

    fn emit(&self, kind: DeviceEventKind) {
        if let Some(token) = self.token {
            let _ = self.events.send(DeviceEvent::new(token, kind));
        }
    }

    fn volume(&self) -> f32 {
        if self.muted { 0.0 } else { 1.0 }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Load(request) => {
                self.clear();
                self.token = Some(request.token);
                self.download(request);
            }
            Command::Downloaded { token, bytes } => {
                if self.token != Some(token) {
                    tracing::debug!(token, "Dropping download for a replaced stream");
                    return;
                }
                if let Err(e) = self.open(bytes) {
                    self.emit(DeviceEventKind::Error(e.to_string()));
                }
            }
            Command::DownloadFailed { token, reason } => {
                if self.token == Some(token) {
                    self.emit(DeviceEventKind::Error(reason));
                }
            }
            Command::Play => {
                self.playing = true;
                if let Some(sink) = &self.sink {
                    sink.play();
                }
            }
            Command::Pause => {
                self.playing = false;
                if let Some(sink) = &self.sink {
                    sink.pause();
                }
            }
            Command::Seek(position) => self.seek(position),
            Command::Rate(rate) => {
                self.rate = rate;
                if let Some(sink) = &self.sink {
                    sink.set_speed(rate as f32);
                }
            }
            Command::Muted(muted) => {
                self.muted = muted;
                if let Some(sink) = &self.sink {
                    sink.set_volume(self.volume());
                }
            }
            Command::Stop => {
                self.clear();
                self.token = None;
            }
        }
    }

    fn download(&self, request: LoadRequest) {
        let downloads = self.downloads.clone();
        let token = request.token;
        self.runtime.spawn(async move {
            let result = async {
                let response = reqwest::get(&request.url).await?.error_for_status()?;
                Ok::<_, reqwest::Error>(response.bytes().await?.to_vec())
            }
            .await;

            let command = match result {
                Ok(bytes) => {
                    tracing::debug!(token, bytes = bytes.len(), "Stream downloaded");
                    Command::Downloaded { token, bytes }
                }
                Err(e) => Command::DownloadFailed {
                    token,
                    reason: format!("network error: {e}"),
                },
            };
            let _ = downloads.send(command);
        });
    }

    fn open(&mut self, bytes: Vec<u8>) -> Result<()> {
        let source = Decoder::new(Cursor::new(bytes.clone())).context("Failed to decode stream")?;
        let duration = source.total_duration().map(|d| d.as_secs_f64());

        let sink = Sink::try_new(&self.handle).context("Failed to create audio sink")?;
        sink.pause();
        sink.set_volume(self.volume());
        sink.set_speed(self.rate as f32);
        sink.append(source);

        self.sink = Some(sink);
        self.bytes = Some(bytes);
        self.ended_sent = false;

        if let Some(duration) = duration {
            self.emit(DeviceEventKind::DurationKnown(duration));
            // The whole stream is in memory.
            self.emit(DeviceEventKind::Buffered(duration));
        }
        self.emit(DeviceEventKind::Ready);
        Ok(())
    }

    fn seek(&mut self, position: f64) {
        let target = Duration::from_secs_f64(position.max(0.0));
        let Some(sink) = &self.sink else { return };

        if sink.empty() {
            // The source was drained at end-of-track; rebuild it from memory.
            let Some(bytes) = self.bytes.clone() else { return };
            match Decoder::new(Cursor::new(bytes)) {
                Ok(source) => sink.append(source),
                Err(e) => {
                    self.emit(DeviceEventKind::Error(format!("Failed to decode stream: {e}")));
                    return;
                }
            }
        }
        if let Err(e) = sink.try_seek(target) {
            tracing::warn!(error = %e, position, "Seek failed");
        }
        self.ended_sent = false;
        self.emit(DeviceEventKind::TimeUpdate(position.max(0.0)));
    }

    fn tick(&mut self) {
        let Some(sink) = &self.sink else { return };
        if sink.empty() {
            if !self.ended_sent {
                self.ended_sent = true;
                self.emit(DeviceEventKind::Ended);
            }
        } else if self.playing && !sink.is_paused() {
            self.emit(DeviceEventKind::TimeUpdate(sink.get_pos().as_secs_f64()));
        }
    }

    fn clear(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.bytes = None;
        self.playing = false;
        self.ended_sent = false;
    }
}
