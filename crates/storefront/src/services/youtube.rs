//! YouTube Data API v3 client for the channel's video listing.
//!
//! Each listing costs two API calls (search, then statistics), so the
//! assembled [`VideoFeed`] is cached with a configurable TTL to stay within
//! the daily quota.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::YouTubeConfig;

/// YouTube Data API base URL.
const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// How many recent uploads are considered.
const RECENT_VIDEOS: u32 = 10;

/// How many popular videos are returned next to the latest one.
const POPULAR_VIDEOS: usize = 3;

/// Errors that can occur when interacting with the YouTube API.
#[derive(Debug, Error)]
pub enum YouTubeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A video as served to the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeVideo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub published_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl YouTubeVideo {
    fn views(&self) -> u64 {
        self.view_count
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

/// Latest upload plus the most viewed of the other recent uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFeed {
    pub latest: Option<YouTubeVideo>,
    pub popular: Vec<YouTubeVideo>,
}

impl VideoFeed {
    /// Build a feed from videos ordered newest first.
    #[must_use]
    pub fn from_recent(videos: Vec<YouTubeVideo>) -> Self {
        let mut videos = videos.into_iter();
        let latest = videos.next();
        let mut popular: Vec<YouTubeVideo> = videos.collect();
        // Stable sort keeps upload order between equal view counts.
        popular.sort_by_key(|v| std::cmp::Reverse(v.views()));
        popular.truncate(POPULAR_VIDEOS);
        Self { latest, popular }
    }
}

// Wire types

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Snippet,
    #[serde(default)]
    statistics: Option<Statistics>,
    #[serde(default)]
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    published_at: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    high: Option<Thumbnail>,
    #[serde(default)]
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    #[serde(default)]
    view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: Option<String>,
}

impl From<VideoItem> for YouTubeVideo {
    fn from(item: VideoItem) -> Self {
        let Thumbnails { high, default } = item.snippet.thumbnails;
        Self {
            id: item.id,
            title: item.snippet.title,
            description: item.snippet.description,
            thumbnail: high.or(default).map(|t| t.url).unwrap_or_default(),
            published_at: item.snippet.published_at,
            view_count: item.statistics.and_then(|s| s.view_count),
            duration: item.content_details.and_then(|c| c.duration),
        }
    }
}

/// YouTube Data API client with a cached feed.
#[derive(Clone)]
pub struct YouTubeClient {
    inner: Arc<YouTubeClientInner>,
}

struct YouTubeClientInner {
    client: reqwest::Client,
    channel_id: String,
    cache: Cache<String, Arc<VideoFeed>>,
}

impl YouTubeClient {
    /// Create a new YouTube API client.
    ///
    /// The key travels in the `X-Goog-Api-Key` header so it never shows up
    /// in logged request URLs.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &YouTubeConfig) -> Result<Self, YouTubeError> {
        let mut key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|e| YouTubeError::Parse(format!("Invalid API key format: {e}")))?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert("X-Goog-Api-Key", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(8)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(YouTubeClientInner {
                client,
                channel_id: config.channel_id.clone(),
                cache,
            }),
        })
    }

    /// The channel's latest video and its most popular recent ones.
    ///
    /// # Errors
    ///
    /// Returns error if either API request fails or a response is malformed.
    #[instrument(skip(self), fields(channel_id = %self.inner.channel_id))]
    pub async fn feed(&self) -> Result<Arc<VideoFeed>, YouTubeError> {
        let cache_key = self.inner.channel_id.clone();

        if let Some(feed) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for video feed");
            return Ok(feed);
        }

        let ids = self.recent_video_ids().await?;
        let videos = if ids.is_empty() {
            Vec::new()
        } else {
            self.videos(&ids).await?
        };

        let feed = Arc::new(VideoFeed::from_recent(videos));
        self.inner.cache.insert(cache_key, Arc::clone(&feed)).await;
        Ok(feed)
    }

    /// Ids of the most recent uploads, newest first.
    async fn recent_video_ids(&self) -> Result<Vec<String>, YouTubeError> {
        let max_results = RECENT_VIDEOS.to_string();
        let search: SearchResponse = self
            .get(
                "search",
                &[
                    ("channelId", self.inner.channel_id.as_str()),
                    ("part", "snippet"),
                    ("order", "date"),
                    ("maxResults", max_results.as_str()),
                    ("type", "video"),
                ],
            )
            .await?;

        Ok(search
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect())
    }

    /// Snippet, statistics and duration for `ids`, in the order given.
    async fn videos(&self, ids: &[String]) -> Result<Vec<YouTubeVideo>, YouTubeError> {
        let joined = ids.join(",");
        let response: VideosResponse = self
            .get(
                "videos",
                &[
                    ("id", joined.as_str()),
                    ("part", "snippet,statistics,contentDetails"),
                ],
            )
            .await?;

        Ok(response.items.into_iter().map(YouTubeVideo::from).collect())
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> Result<T, YouTubeError> {
        let response = self
            .inner
            .client
            .get(format!("{BASE_URL}/{resource}"))
            .query(params)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(YouTubeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| YouTubeError::Parse(e.to_string()))
    }
}
