//! Track resolver - the metadata / stream collaborator
//!
//! - `retry`: Retry-once-with-fresh-session wrapper for metadata lookups
//! - `piped`: HTTP client for a Piped-compatible API

mod piped;
mod retry;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ResolveError;
use crate::model::{StreamLocator, Track};

pub use piped::{PipedFactory, PipedResolver, DEFAULT_INSTANCE};
pub use retry::RetryingResolver;

/// Resolves track ids to metadata and to fresh, time-limited stream locators.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve_metadata(&self, track_id: &str) -> Result<Track, ResolveError>;

    async fn resolve_stream_locator(&self, track_id: &str) -> Result<StreamLocator, ResolveError>;

    async fn search(&self, query: &str) -> Result<Vec<Track>, ResolveError>;
}

/// Builds new resolver sessions; used to replace a session that went stale.
pub trait ResolverFactory: Send + Sync {
    fn create(&self) -> Result<Arc<dyn TrackResolver>, ResolveError>;
}
