// src/integrations/animefire/client.rs
//
// HTTP side of the catalog reader.
//
// Episodes are discovered by scanning ordinal pages until one is missing,
// since the catalog publishes no episode index.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::parsing;
use crate::domain::{CatalogEntry, DownloadLink, WatchLink, ALL_EPISODES_SUFFIX};
use crate::error::{AppError, AppResult};
use crate::ports::SourceCatalogReader;

pub const DEFAULT_CATALOG_URL: &str = "https://animefire.plus";
pub const DEFAULT_DOWNLOAD_HOST: &str = "https://s2.lightspeedst.net/s2/";

/// When an ordinal scan stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPolicy {
    /// Ordinals `0..max_ordinal` are tried
    pub max_ordinal: u32,
    /// Some shows start at episode 1, so a missing page 0 is skipped
    /// instead of ending the scan
    pub tolerate_missing_first: bool,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            max_ordinal: 1000,
            tolerate_missing_first: true,
        }
    }
}

impl ScanPolicy {
    /// Whether scanning continues after ordinal `ordinal` turned out missing.
    pub fn continues_after_missing(&self, ordinal: u32) -> bool {
        ordinal == 0 && self.tolerate_missing_first
    }
}

pub struct AnimeFireClient {
    http_client: Client,
    catalog_url: String,
    download_host: String,
    include_dubbed: bool,
    scan: ScanPolicy,
}

impl AnimeFireClient {
    pub fn new(catalog_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            catalog_url: catalog_url.into().trim_end_matches('/').to_string(),
            download_host: DEFAULT_DOWNLOAD_HOST.to_string(),
            include_dubbed: false,
            scan: ScanPolicy::default(),
        })
    }

    pub fn with_download_host(mut self, host: impl Into<String>) -> Self {
        self.download_host = host.into();
        self
    }

    pub fn with_dubbed(mut self, include_dubbed: bool) -> Self {
        self.include_dubbed = include_dubbed;
        self
    }

    pub fn with_scan_policy(mut self, scan: ScanPolicy) -> Self {
        self.scan = scan;
        self
    }

    /// Body of `url`, or `None` when the page does not exist.
    async fn fetch_page(&self, url: &str) -> AppResult<Option<String>> {
        let response = self.http_client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AppError::Transport(format!("GET {} returned status {}", url, status)));
        }

        Ok(Some(response.text().await?))
    }

    /// Walk ordinal pages, parsing each with `parse`, until the scan policy
    /// says stop.
    async fn scan_ordinals<T, U, P>(&self, page_url: U, parse: P) -> AppResult<Vec<T>>
    where
        U: Fn(u32) -> String,
        P: Fn(&str, &str, u32) -> AppResult<Option<T>>,
    {
        let mut found = Vec::new();

        for ordinal in 0..self.scan.max_ordinal {
            let url = page_url(ordinal);
            let parsed = match self.fetch_page(&url).await? {
                Some(html) => parse(&html, &url, ordinal)?,
                None => None,
            };

            match parsed {
                Some(item) => found.push(item),
                None if self.scan.continues_after_missing(ordinal) => {
                    log::debug!("No page at {}, trying the next ordinal", url);
                }
                None => {
                    log::debug!("Scan ended at {}", url);
                    break;
                }
            }
        }

        Ok(found)
    }
}

#[async_trait]
impl SourceCatalogReader for AnimeFireClient {
    async fn list_releases(&self, page: u32) -> AppResult<Vec<CatalogEntry>> {
        let url = format!("{}/em-lancamento/{}", self.catalog_url, page);
        match self.fetch_page(&url).await? {
            Some(html) => {
                parsing::parse_release_page(&html, &self.catalog_url, self.include_dubbed)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn list_watch_links(
        &self,
        detail_href: &str,
        source_id: i64,
    ) -> AppResult<Vec<WatchLink>> {
        let base = detail_href
            .trim_end_matches('/')
            .trim_end_matches(ALL_EPISODES_SUFFIX)
            .to_string();

        let links = self
            .scan_ordinals(
                |ordinal| format!("{}/{}", base, ordinal),
                |html, url, ordinal| {
                    Ok(parsing::page_has_anchor(html)?.then(|| WatchLink {
                        source_id,
                        ordinal,
                        watch_link: url.to_string(),
                    }))
                },
            )
            .await?;

        log::debug!("{} watch pages found for source {}", links.len(), source_id);
        Ok(links)
    }

    async fn list_download_links(
        &self,
        catalog_name: &str,
        source_id: i64,
    ) -> AppResult<Vec<DownloadLink>> {
        let links = self
            .scan_ordinals(
                |ordinal| format!("{}/download/{}/{}", self.catalog_url, catalog_name, ordinal),
                |html, _url, ordinal| {
                    parsing::parse_download_page(html, &self.download_host, source_id, ordinal)
                },
            )
            .await?;

        log::debug!("{} download pages found for source {}", links.len(), source_id);
        Ok(links)
    }
}
