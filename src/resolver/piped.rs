//! Piped API client
//!
//! Resolves video ids against a Piped-compatible instance:
//! `GET /streams/{id}` for metadata and audio streams, `GET /search` for search.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ResolveError;
use crate::model::{Channel, StreamLocator, Track};

use super::{ResolverFactory, TrackResolver};

pub const DEFAULT_INSTANCE: &str = "https://pipedapi.kavin.rocks";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("tubeplay/", env!("CARGO_PKG_VERSION"));
/// Container the bundled decoder handles best; preferred over raw bitrate.
const PREFERRED_MIME: &str = "audio/mp4";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamsResponse {
    #[serde(default)]
    title: String,
    #[serde(default)]
    duration: i64,
    #[serde(default)]
    uploader: String,
    #[serde(default)]
    uploader_url: Option<String>,
    #[serde(default)]
    uploader_avatar: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    audio_streams: Vec<AudioStream>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudioStream {
    url: String,
    #[serde(default)]
    bitrate: u32,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    #[serde(default)]
    url: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    uploader_name: Option<String>,
    #[serde(default)]
    uploader_url: Option<String>,
    #[serde(default)]
    uploader_avatar: Option<String>,
    #[serde(default)]
    duration: i64,
}

/// One HTTP session against a Piped instance.
pub struct PipedResolver {
    client: reqwest::Client,
    base_url: String,
}

impl PipedResolver {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ResolveError::ProviderUnavailable(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        subject: &str,
    ) -> Result<T, ResolveError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "Piped request started");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ResolveError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        match status {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(ResolveError::NotFound(subject.to_string())),
            StatusCode::FORBIDDEN | StatusCode::GONE | StatusCode::UNAUTHORIZED => {
                return Err(ResolveError::Expired(format!("{subject}: HTTP {status}")));
            }
            _ => {
                return Err(ResolveError::ProviderUnavailable(format!("{subject}: HTTP {status}")));
            }
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ResolveError::ProviderUnavailable(format!("{subject}: {e}")))
    }

    async fn streams(&self, track_id: &str) -> Result<StreamsResponse, ResolveError> {
        self.get_json(&format!("/streams/{track_id}"), &[], track_id).await
    }
}

#[async_trait]
impl TrackResolver for PipedResolver {
    async fn resolve_metadata(&self, track_id: &str) -> Result<Track, ResolveError> {
        let streams = self.streams(track_id).await.map_err(|e| match e {
            // Metadata has no expiry; an auth failure here is a provider problem.
            ResolveError::Expired(reason) => ResolveError::ProviderUnavailable(reason),
            other => other,
        })?;

        let track = Track {
            id: track_id.to_string(),
            title: streams.title,
            duration: clamp_duration(streams.duration),
            channel: Channel {
                id: channel_id(streams.uploader_url.as_deref()),
                name: streams.uploader,
                thumbnail: streams.uploader_avatar.unwrap_or_default(),
            },
            thumbnail: streams.thumbnail_url.unwrap_or_default(),
        };
        tracing::debug!(track_id, title = %track.title, duration = track.duration, "Metadata resolved");
        Ok(track)
    }

    async fn resolve_stream_locator(&self, track_id: &str) -> Result<StreamLocator, ResolveError> {
        let streams = self.streams(track_id).await?;
        let stream = pick_audio_stream(streams.audio_streams)
            .ok_or_else(|| ResolveError::NotFound(format!("{track_id}: no audio streams")))?;

        let mut locator = StreamLocator::new(track_id, stream.url);
        if let Some(mime_type) = stream.mime_type {
            locator = locator.with_mime_type(mime_type);
        }
        tracing::debug!(track_id, bitrate = stream.bitrate, mime_type = ?locator.mime_type, "Stream locator resolved");
        Ok(locator)
    }

    async fn search(&self, query: &str) -> Result<Vec<Track>, ResolveError> {
        let response: SearchResponse = self
            .get_json("/search", &[("q", query), ("filter", "videos")], query)
            .await
            .map_err(|e| match e {
                ResolveError::NotFound(_) => ResolveError::ProviderUnavailable("search endpoint missing".into()),
                other => other,
            })?;

        let tracks: Vec<Track> = response
            .items
            .into_iter()
            .filter(|item| item.kind == "stream")
            .filter_map(|item| {
                let id = video_id(&item.url)?;
                Some(Track {
                    id,
                    title: item.title,
                    duration: clamp_duration(item.duration),
                    channel: Channel {
                        id: channel_id(item.uploader_url.as_deref()),
                        name: item.uploader_name.unwrap_or_default(),
                        thumbnail: item.uploader_avatar.unwrap_or_default(),
                    },
                    thumbnail: item.thumbnail.unwrap_or_default(),
                })
            })
            .collect();

        tracing::info!(query, results = tracks.len(), "Search completed");
        Ok(tracks)
    }
}

/// Creates a new HTTP session per call; plugs into `RetryingResolver`.
pub struct PipedFactory {
    base_url: String,
}

impl PipedFactory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl ResolverFactory for PipedFactory {
    fn create(&self) -> Result<Arc<dyn TrackResolver>, ResolveError> {
        Ok(Arc::new(PipedResolver::new(self.base_url.clone())?))
    }
}

fn pick_audio_stream(streams: Vec<AudioStream>) -> Option<AudioStream> {
    streams
        .into_iter()
        .filter(|s| !s.url.is_empty())
        .max_by_key(|s| {
            let preferred = s
                .mime_type
                .as_deref()
                .is_some_and(|m| m.starts_with(PREFERRED_MIME));
            (preferred, s.bitrate)
        })
}

/// Live streams report -1.
fn clamp_duration(duration: i64) -> u32 {
    u32::try_from(duration.max(0)).unwrap_or(u32::MAX)
}

fn video_id(url: &str) -> Option<String> {
    let id = url.strip_prefix("/watch?v=")?;
    let id = id.split('&').next().unwrap_or(id);
    (!id.is_empty()).then(|| id.to_string())
}

fn channel_id(uploader_url: Option<&str>) -> String {
    uploader_url
        .map(|url| url.trim_start_matches("/channel/").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(url: &str, bitrate: u32, mime: &str) -> AudioStream {
        AudioStream {
            url: url.into(),
            bitrate,
            mime_type: Some(mime.into()),
        }
    }

    #[test]
    fn prefers_mp4_audio_then_bitrate() {
        let picked = pick_audio_stream(vec![
            stream("opus-hi", 160_000, "audio/webm"),
            stream("m4a-lo", 48_000, "audio/mp4"),
            stream("m4a-hi", 128_000, "audio/mp4"),
        ]);
        assert_eq!(picked.map(|s| s.url).as_deref(), Some("m4a-hi"));

        let picked = pick_audio_stream(vec![
            stream("opus-lo", 64_000, "audio/webm"),
            stream("opus-hi", 160_000, "audio/webm"),
        ]);
        assert_eq!(picked.map(|s| s.url).as_deref(), Some("opus-hi"));
        assert!(pick_audio_stream(Vec::new()).is_none());
    }

    #[test]
    fn parses_ids_from_piped_urls() {
        assert_eq!(video_id("/watch?v=dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(video_id("/watch?v=abc&t=10").as_deref(), Some("abc"));
        assert_eq!(video_id("/playlist?list=PL123"), None);
        assert_eq!(video_id("/watch?v="), None);
        assert_eq!(channel_id(Some("/channel/UC123")), "UC123");
        assert_eq!(channel_id(None), "");
    }

    #[test]
    fn negative_durations_are_unknown() {
        assert_eq!(clamp_duration(-1), 0);
        assert_eq!(clamp_duration(213), 213);
    }

    #[test]
    fn base_url_is_normalized() {
        let resolver = PipedResolver::new("https://piped.example/").unwrap();
        assert_eq!(resolver.base_url(), "https://piped.example");
    }
}
