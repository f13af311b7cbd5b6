//! Shared fixtures for session tests: an in-memory resolver and helpers to
//! spin up a session on the simulated output.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Notify};

use tubeplay::model::Channel;
use tubeplay::output::{self, SimulatedOptions, SimulatedOutput};
use tubeplay::resolver::TrackResolver;
use tubeplay::{ResolveError, Session, SessionConfig, SessionHandle, SessionSnapshot, StreamLocator, Track};

pub fn track(id: &str, duration: u32) -> Track {
    Track {
        id: id.to_string(),
        title: format!("Title {id}"),
        duration,
        channel: Channel {
            id: format!("UC{id}"),
            name: format!("Channel {id}"),
            thumbnail: String::new(),
        },
        thumbnail: String::new(),
    }
}

#[derive(Default)]
struct Script {
    tracks: HashMap<String, Track>,
    /// Ids whose locator lookup fails.
    no_locator: HashSet<String>,
    /// Ids whose locator points at a URL the simulated device rejects.
    broken_stream: HashSet<String>,
    /// Locator lookups for these ids wait until released.
    gates: HashMap<String, Arc<Notify>>,
    locator_calls: Vec<String>,
}

/// In-memory resolver driven by a script.
#[derive(Clone, Default)]
pub struct ScriptedResolver {
    script: Arc<Mutex<Script>>,
}

impl ScriptedResolver {
    pub fn with_tracks(tracks: &[Track]) -> Self {
        let resolver = Self::default();
        {
            let mut script = resolver.script.lock().unwrap();
            for track in tracks {
                script.tracks.insert(track.id.clone(), track.clone());
            }
        }
        resolver
    }

    pub fn without_locator(self, id: &str) -> Self {
        self.script.lock().unwrap().no_locator.insert(id.to_string());
        self
    }

    pub fn with_broken_stream(self, id: &str) -> Self {
        self.script.lock().unwrap().broken_stream.insert(id.to_string());
        self
    }

    /// Hold locator lookups for `id` until the returned handle is notified.
    pub fn gate(&self, id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.script.lock().unwrap().gates.insert(id.to_string(), gate.clone());
        gate
    }

    pub fn locator_calls(&self, id: &str) -> usize {
        self.script
            .lock()
            .unwrap()
            .locator_calls
            .iter()
            .filter(|call| call.as_str() == id)
            .count()
    }
}

#[async_trait]
impl TrackResolver for ScriptedResolver {
    async fn resolve_metadata(&self, track_id: &str) -> Result<Track, ResolveError> {
        let found = self.script.lock().unwrap().tracks.get(track_id).cloned();
        found.ok_or_else(|| ResolveError::NotFound(track_id.to_string()))
    }

    async fn resolve_stream_locator(&self, track_id: &str) -> Result<StreamLocator, ResolveError> {
        let (gate, missing, broken) = {
            let mut script = self.script.lock().unwrap();
            script.locator_calls.push(track_id.to_string());
            (
                script.gates.get(track_id).cloned(),
                script.no_locator.contains(track_id),
                script.broken_stream.contains(track_id),
            )
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if missing {
            return Err(ResolveError::NotFound(track_id.to_string()));
        }
        let url = if broken {
            format!("https://cdn.test/broken/{track_id}")
        } else {
            format!("https://cdn.test/audio/{track_id}")
        };
        Ok(StreamLocator::new(track_id, url).with_mime_type("audio/mp4"))
    }

    async fn search(&self, query: &str) -> Result<Vec<Track>, ResolveError> {
        let script = self.script.lock().unwrap();
        let mut found: Vec<Track> = script
            .tracks
            .values()
            .filter(|t| t.title.contains(query))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }
}

pub struct Harness {
    pub session: SessionHandle,
    pub state: watch::Receiver<SessionSnapshot>,
    pub resolver: ScriptedResolver,
}

pub fn start(resolver: ScriptedResolver) -> Harness {
    start_with(
        resolver,
        SessionConfig {
            shuffle_seed: Some(7),
            ..SessionConfig::default()
        },
    )
}

pub fn start_with(resolver: ScriptedResolver, config: SessionConfig) -> Harness {
    let (events, events_rx) = output::device_channel();
    let device = SimulatedOutput::spawn(
        events,
        SimulatedOptions {
            fail_urls_containing: Some("/broken/".into()),
            ..SimulatedOptions::default()
        },
    );
    let session = SessionHandle::spawn(config, Arc::new(resolver.clone()), Box::new(device), events_rx);
    let state = session.subscribe();
    Harness {
        session,
        state,
        resolver,
    }
}

impl Harness {
    /// Wait (in virtual time) until the snapshot satisfies `predicate`.
    pub async fn until(&mut self, what: &str, predicate: impl FnMut(&SessionSnapshot) -> bool) -> SessionSnapshot {
        let result = tokio::time::timeout(Duration::from_secs(600), self.state.wait_for(predicate))
            .await
            .map(|waited| waited.map(|snapshot| snapshot.clone()));
        match result {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(_)) => panic!("session closed while waiting for {what}"),
            Err(_) => panic!("timed out waiting for {what}; last state: {:?}", *self.state.borrow()),
        }
    }

    pub async fn until_playing(&mut self, id: &str) -> SessionSnapshot {
        let id = id.to_string();
        self.until(&format!("{id} playing"), move |s| s.is_playing() && s.track_id() == Some(id.as_str()))
            .await
    }

    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
