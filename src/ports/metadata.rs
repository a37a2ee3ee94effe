use async_trait::async_trait;

use crate::domain::AnimeMetadata;
use crate::error::AppResult;

/// Canonical identifiers and descriptive fields for anime titles
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Canonical id of the best match for `title`, if any.
    async fn search(&self, title: &str) -> AppResult<Option<i64>>;

    /// Full metadata record for `source_id`, if the provider knows it.
    async fn fetch(&self, source_id: i64) -> AppResult<Option<AnimeMetadata>>;
}
