// src/integrations/jikan/client.rs
//
// Jikan REST client
//
// ARCHITECTURE:
// - Resolves a catalog title to a MyAnimeList id (`mal_id`)
// - Maps the provider's anime record into `AnimeMetadata`
// - Spaces requests to stay under the public rate limit
//
// A missing record is `Ok(None)`; every other failure is Transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::domain::AnimeMetadata;
use crate::error::{AppError, AppResult};
use crate::ports::MetadataResolver;

pub const DEFAULT_METADATA_URL: &str = "https://api.jikan.moe/v4";
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(400);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    mal_id: i64,
}

#[derive(Debug, Deserialize)]
struct AnimeResponse {
    data: AnimeData,
}

#[derive(Debug, Deserialize)]
struct AnimeData {
    mal_id: i64,
    title: String,
    title_english: Option<String>,
    title_japanese: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    episodes: Option<u32>,
    status: Option<String>,
    airing: Option<bool>,
    aired: Option<AiredData>,
    rating: Option<String>,
    duration: Option<String>,
    season: Option<String>,
    year: Option<i32>,
    #[serde(default)]
    studios: Vec<NamedResource>,
    #[serde(default)]
    producers: Vec<NamedResource>,
    synopsis: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AiredData {
    string: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
}

/// Rate limiter state
struct RateLimiter {
    last_request: Option<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: None,
            min_interval,
        }
    }

    async fn wait_if_needed(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// Jikan API Client
pub struct JikanClient {
    base_url: String,
    http_client: Client,
    rate_limiter: Mutex<RateLimiter>,
}

impl JikanClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
            rate_limiter: Mutex::new(RateLimiter::new(MIN_REQUEST_INTERVAL)),
        })
    }

    /// GET `path` and decode the JSON body. `None` on 404.
    async fn get_json<T>(&self, path: &str) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.rate_limiter.lock().await.wait_if_needed().await;

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http_client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AppError::Transport(format!("Jikan API returned status: {}", status)));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| AppError::Transport(format!("Failed to parse Jikan response: {}", e)))
    }

    fn map_anime(data: AnimeData) -> AnimeMetadata {
        AnimeMetadata {
            source_id: data.mal_id,
            title: data.title,
            title_english: data.title_english,
            title_japanese: data.title_japanese,
            kind: data.kind,
            episodes: data.episodes,
            status: data.status,
            airing: data.airing,
            aired: data.aired.and_then(|a| a.string),
            rating: data.rating,
            duration: data.duration,
            season: data.season,
            year: data.year,
            studios: data.studios.into_iter().map(|s| s.name).collect(),
            producers: data.producers.into_iter().map(|p| p.name).collect(),
            synopsis: data.synopsis,
        }
    }
}

#[async_trait]
impl MetadataResolver for JikanClient {
    async fn search(&self, title: &str) -> AppResult<Option<i64>> {
        let path = format!("/anime?q={}&limit=1", urlencoding::encode(title));
        let response: Option<SearchResponse> = self.get_json(&path).await?;

        let found = response.and_then(|r| r.data.into_iter().next()).map(|hit| hit.mal_id);
        if found.is_none() {
            log::debug!("Jikan has no match for '{}'", title);
        }
        Ok(found)
    }

    async fn fetch(&self, source_id: i64) -> AppResult<Option<AnimeMetadata>> {
        let path = format!("/anime/{}", source_id);
        let response: Option<AnimeResponse> = self.get_json(&path).await?;
        Ok(response.map(|r| Self::map_anime(r.data)))
    }
}
