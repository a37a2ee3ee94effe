use async_trait::async_trait;

use crate::domain::{CatalogEntry, DownloadLink, WatchLink};
use crate::error::AppResult;

/// Source catalog listing and per-episode page probing
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceCatalogReader: Send + Sync {
    /// Releases listed on one page; empty when the page has no entries.
    async fn list_releases(&self, page: u32) -> AppResult<Vec<CatalogEntry>>;

    /// Stream pages of an anime in ordinal order.
    async fn list_watch_links(&self, detail_href: &str, source_id: i64)
        -> AppResult<Vec<WatchLink>>;

    /// Download links of an anime in ordinal order.
    async fn list_download_links(
        &self,
        catalog_name: &str,
        source_id: i64,
    ) -> AppResult<Vec<DownloadLink>>;
}
