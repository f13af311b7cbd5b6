//! Retry-once policy for metadata lookups
//!
//! A provider session can go stale independently of any single track, so a
//! failed metadata lookup or search is retried exactly once against a freshly
//! created session. Stream locators are single-use and are never retried here.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::ResolveError;
use crate::model::{StreamLocator, Track};

use super::{ResolverFactory, TrackResolver};

struct ResolverSession {
    generation: u64,
    resolver: Arc<dyn TrackResolver>,
}

pub struct RetryingResolver {
    factory: Arc<dyn ResolverFactory>,
    session: RwLock<ResolverSession>,
}

impl RetryingResolver {
    pub fn new(factory: Arc<dyn ResolverFactory>) -> Result<Self, ResolveError> {
        let resolver = factory.create()?;
        Ok(Self {
            factory,
            session: RwLock::new(ResolverSession {
                generation: 0,
                resolver,
            }),
        })
    }

    /// How many times the session has been replaced.
    pub async fn generation(&self) -> u64 {
        self.session.read().await.generation
    }

    async fn current(&self) -> (u64, Arc<dyn TrackResolver>) {
        let session = self.session.read().await;
        (session.generation, session.resolver.clone())
    }

    /// Replace the session that failed. If another caller already replaced it,
    /// reuse theirs instead of creating a second one.
    async fn refresh(&self, failed_generation: u64) -> Result<Arc<dyn TrackResolver>, ResolveError> {
        let mut session = self.session.write().await;
        if session.generation == failed_generation {
            session.resolver = self.factory.create()?;
            session.generation += 1;
            tracing::info!(generation = session.generation, "Resolver session refreshed");
        }
        Ok(session.resolver.clone())
    }

    async fn with_fresh_session<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T, ResolveError>
    where
        F: Fn(Arc<dyn TrackResolver>) -> Fut,
        Fut: Future<Output = Result<T, ResolveError>>,
    {
        let (generation, resolver) = self.current().await;
        match call(resolver).await {
            Err(ResolveError::ProviderUnavailable(reason)) => {
                tracing::info!(operation, %reason, "Provider call failed, retrying with a fresh session");
                let fresh = self.refresh(generation).await?;
                let result = call(fresh).await;
                if let Err(e) = &result {
                    tracing::warn!(operation, error = %e, "Provider call failed after session refresh");
                }
                result
            }
            other => other,
        }
    }
}

#[async_trait]
impl TrackResolver for RetryingResolver {
    async fn resolve_metadata(&self, track_id: &str) -> Result<Track, ResolveError> {
        let track_id = track_id.to_string();
        self.with_fresh_session("resolve_metadata", move |resolver| {
            let track_id = track_id.clone();
            async move { resolver.resolve_metadata(&track_id).await }
        })
        .await
    }

    async fn resolve_stream_locator(&self, track_id: &str) -> Result<StreamLocator, ResolveError> {
        let (_, resolver) = self.current().await;
        resolver.resolve_stream_locator(track_id).await
    }

    async fn search(&self, query: &str) -> Result<Vec<Track>, ResolveError> {
        let query = query.to_string();
        self.with_fresh_session("search", move |resolver| {
            let query = query.clone();
            async move { resolver.search(&query).await }
        })
        .await
    }
}
