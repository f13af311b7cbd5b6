//! Stream session manager
//!
//! Keeps at most one resolver fetch in flight, for the current track only, and
//! at most one bound stream locator. Every fetch gets a ticket; a completion is
//! accepted only if its ticket and track id still match the pending fetch, so
//! a slow fetch for a track the user already left can never bind late.

use std::sync::Arc;

use futures::future::{AbortHandle, Abortable};
use tokio::sync::mpsc;

use crate::error::ResolveError;
use crate::model::{StreamLocator, Track};
use crate::resolver::TrackResolver;

pub type Ticket = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchKind {
    Metadata,
    Locator,
}

#[derive(Debug)]
pub enum FetchOutcome {
    Metadata(Result<Track, ResolveError>),
    Locator(Result<StreamLocator, ResolveError>),
}

#[derive(Debug)]
pub struct FetchCompletion {
    pub ticket: Ticket,
    pub track_id: String,
    pub outcome: FetchOutcome,
}

struct PendingFetch {
    ticket: Ticket,
    track_id: String,
    kind: FetchKind,
    abort: AbortHandle,
}

pub struct StreamSessionManager {
    resolver: Arc<dyn TrackResolver>,
    completions: mpsc::UnboundedSender<FetchCompletion>,
    pending: Option<PendingFetch>,
    bound: Option<StreamLocator>,
    next_ticket: Ticket,
}

impl StreamSessionManager {
    pub fn new(
        resolver: Arc<dyn TrackResolver>,
        completions: mpsc::UnboundedSender<FetchCompletion>,
    ) -> Self {
        Self {
            resolver,
            completions,
            pending: None,
            bound: None,
            next_ticket: 1,
        }
    }

    /// Resolve metadata for `track_id`, replacing whatever was in flight.
    pub fn fetch_metadata(&mut self, track_id: &str) -> Ticket {
        self.start(track_id, FetchKind::Metadata)
    }

    /// Fetch a fresh locator for `track_id`, replacing whatever was in flight.
    /// Locators are never reused, even when returning to a track.
    pub fn fetch_locator(&mut self, track_id: &str) -> Ticket {
        self.start(track_id, FetchKind::Locator)
    }

    /// Abort the in-flight fetch and forget the bound locator.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(ticket = pending.ticket, track_id = %pending.track_id, kind = ?pending.kind, "Cancelling in-flight fetch");
            pending.abort.abort();
        }
        self.bound = None;
    }

    /// Match a completion against the pending fetch. Stale completions are
    /// dropped and `None` is returned; a successful locator is bound.
    pub fn accept(&mut self, completion: FetchCompletion) -> Option<FetchOutcome> {
        let matches = self
            .pending
            .as_ref()
            .is_some_and(|p| p.ticket == completion.ticket && p.track_id == completion.track_id);
        if !matches {
            tracing::debug!(
                ticket = completion.ticket,
                track_id = %completion.track_id,
                "Discarding stale fetch completion"
            );
            return None;
        }
        self.pending = None;

        if let FetchOutcome::Locator(Ok(locator)) = &completion.outcome {
            if !locator.is_for(&completion.track_id) {
                tracing::warn!(
                    expected = %completion.track_id,
                    got = %locator.track_id,
                    "Resolver returned a locator for another track"
                );
                return Some(FetchOutcome::Locator(Err(ResolveError::NotFound(
                    completion.track_id,
                ))));
            }
            self.bound = Some(locator.clone());
        }
        Some(completion.outcome)
    }

    pub fn locator(&self) -> Option<&StreamLocator> {
        self.bound.as_ref()
    }

    pub fn pending(&self) -> Option<(Ticket, FetchKind)> {
        self.pending.as_ref().map(|p| (p.ticket, p.kind))
    }

    fn start(&mut self, track_id: &str, kind: FetchKind) -> Ticket {
        self.cancel();

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let (abort, registration) = AbortHandle::new_pair();
        let resolver = self.resolver.clone();
        let completions = self.completions.clone();
        let id = track_id.to_string();

        let fetch = async move {
            let outcome = match kind {
                FetchKind::Metadata => FetchOutcome::Metadata(resolver.resolve_metadata(&id).await),
                FetchKind::Locator => FetchOutcome::Locator(resolver.resolve_stream_locator(&id).await),
            };
            let _ = completions.send(FetchCompletion {
                ticket,
                track_id: id,
                outcome,
            });
        };
        tokio::spawn(Abortable::new(fetch, registration));

        tracing::debug!(ticket, track_id, ?kind, "Fetch started");
        self.pending = Some(PendingFetch {
            ticket,
            track_id: track_id.to_string(),
            kind,
            abort,
        });
        ticket
    }
}
