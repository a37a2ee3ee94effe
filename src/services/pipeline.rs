// src/services/pipeline.rs
//
// End-to-end run: collect releases, ingest them, publish what is new.
// Ingestion of a batch completes before any publication starts.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{CatalogEntry, ChatRef};
use crate::error::{AppError, AppResult};
use crate::ports::SourceCatalogReader;
use crate::services::ingestion_coordinator::{IngestionCoordinator, IngestionReport};
use crate::services::publication_tracker::{PublicationSummary, PublicationTracker};

/// Upper bound on catalog entries collected per run
pub const HARD_EXTRACT_LIMIT: usize = 100;

/// Where a run publishes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub platform: String,
    pub chat: ChatRef,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub ingestion: IngestionReport,
    pub animes: PublicationSummary,
    pub episodes: PublicationSummary,
}

pub struct Pipeline {
    catalog: Arc<dyn SourceCatalogReader>,
    coordinator: IngestionCoordinator,
    tracker: Option<PublicationTracker>,
}

impl Pipeline {
    /// Ingestion-only pipeline; see `with_publication`.
    pub fn new(catalog: Arc<dyn SourceCatalogReader>, coordinator: IngestionCoordinator) -> Self {
        Self {
            catalog,
            coordinator,
            tracker: None,
        }
    }

    pub fn with_publication(mut self, tracker: PublicationTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    fn tracker(&self) -> AppResult<&PublicationTracker> {
        self.tracker
            .as_ref()
            .ok_or_else(|| AppError::Config("publishing is not configured".to_string()))
    }

    /// Page through the release listing from `start_page` until a page is
    /// empty or `limit` entries (at most `HARD_EXTRACT_LIMIT`) are collected.
    pub async fn collect_releases(
        &self,
        start_page: u32,
        limit: usize,
    ) -> AppResult<Vec<CatalogEntry>> {
        let limit = limit.min(HARD_EXTRACT_LIMIT);
        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        let mut page = start_page.max(1);

        while entries.len() < limit {
            let listed = match self.catalog.list_releases(page).await {
                Ok(listed) => listed,
                Err(err) if page == start_page.max(1) => return Err(err),
                Err(err) => {
                    log::warn!("Stopping at release page {}: {}", page, err);
                    break;
                }
            };

            if listed.is_empty() {
                log::debug!("Release page {} is empty, stopping", page);
                break;
            }

            for entry in listed {
                if entries.len() >= limit {
                    break;
                }
                if seen.insert(entry.detail_href.clone()) {
                    entries.push(entry);
                }
            }
            page += 1;
        }

        log::info!("Collected {} releases from page {} on", entries.len(), start_page);
        Ok(entries)
    }

    pub async fn ingest_releases(
        &self,
        start_page: u32,
        limit: usize,
    ) -> AppResult<IngestionReport> {
        let batch = self.collect_releases(start_page, limit).await?;
        self.coordinator.ingest(&batch).await
    }

    /// Ingest a single anime from its catalog detail page URL.
    pub async fn ingest_url(&self, detail_href: &str) -> AppResult<IngestionReport> {
        let entry = CatalogEntry::from_detail_href(detail_href.trim()).ok_or_else(|| {
            AppError::Other(format!("'{}' is not an anime detail URL", detail_href))
        })?;
        self.coordinator.ingest(&[entry]).await
    }

    /// Ingest, then publish the new animes followed by the new episodes.
    pub async fn run(
        &self,
        start_page: u32,
        limit: usize,
        destination: &Destination,
    ) -> AppResult<RunReport> {
        let tracker = self.tracker()?;
        let mut ingestion = self.ingest_releases(start_page, limit).await?;

        let animes = tracker
            .publish_all(&mut ingestion.new_animes, &destination.platform, &destination.chat)
            .await?;
        let episodes = tracker
            .publish_all(&mut ingestion.new_episodes, &destination.platform, &destination.chat)
            .await?;

        Ok(RunReport {
            ingestion,
            animes,
            episodes,
        })
    }

    pub async fn publish_pending(
        &self,
        destination: &Destination,
    ) -> AppResult<PublicationSummary> {
        self.tracker()?
            .publish_pending(&destination.platform, &destination.chat)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnimeMetadata, DownloadLink, WatchLink};
    use crate::events::EventBus;
    use crate::ports::{MockChannelPublisher, MockMetadataResolver, MockSourceCatalogReader};
    use crate::repositories::store::test_support::memory_store;
    use crate::repositories::EntityStore;
    use crate::services::destination_registry::{ChannelSpec, DestinationRegistry};
    use crate::services::publication_tracker::PublishOptions;
    use crate::services::retry::RetryPolicy;

    fn listing(page: u32, count: usize) -> Vec<CatalogEntry> {
        (0..count)
            .map(|i| {
                CatalogEntry::from_listing(
                    format!("show {} {}", page, i),
                    format!("https://catalog.test/animes/show-{}-{}-todos-os-episodios", page, i),
                )
                .unwrap()
            })
            .collect()
    }

    fn pipeline(
        catalog: MockSourceCatalogReader,
        publisher: MockChannelPublisher,
        store: EntityStore,
    ) -> Pipeline {
        let catalog: Arc<dyn SourceCatalogReader> = Arc::new(catalog);
        let mut resolver = MockMetadataResolver::new();
        resolver.expect_search().returning(|title| {
            Ok(title.strip_prefix("show 1 ").and_then(|n| n.parse::<i64>().ok()).map(|n| n + 100))
        });
        resolver.expect_fetch().returning(|source_id| {
            Ok(Some(AnimeMetadata {
                source_id,
                title: format!("Anime {}", source_id),
                ..Default::default()
            }))
        });
        let bus = Arc::new(EventBus::new());

        Pipeline::new(
            Arc::clone(&catalog),
            IngestionCoordinator::new(catalog, Arc::new(resolver), store.clone(), Arc::clone(&bus)),
        )
        .with_publication(PublicationTracker::new(
            store,
            Arc::new(publisher),
            bus,
            RetryPolicy::none(),
            PublishOptions::default(),
        ))
    }

    #[tokio::test]
    async fn test_collect_stops_at_empty_page() {
        let mut catalog = MockSourceCatalogReader::new();
        catalog
            .expect_list_releases()
            .returning(|page| Ok(if page <= 2 { listing(page, 3) } else { Vec::new() }));

        let entries = pipeline(catalog, MockChannelPublisher::new(), memory_store())
            .collect_releases(1, 50)
            .await
            .unwrap();

        assert_eq!(entries.len(), 6);
    }

    #[tokio::test]
    async fn test_collect_respects_limit_and_hard_cap() {
        let mut catalog = MockSourceCatalogReader::new();
        catalog.expect_list_releases().returning(|page| Ok(listing(page, 30)));
        let pipeline = pipeline(catalog, MockChannelPublisher::new(), memory_store());

        assert_eq!(pipeline.collect_releases(1, 4).await.unwrap().len(), 4);
        assert_eq!(
            pipeline.collect_releases(1, 500).await.unwrap().len(),
            HARD_EXTRACT_LIMIT
        );
    }

    #[tokio::test]
    async fn test_run_publishes_new_entities_once() {
        let store = memory_store();
        let (_, channel) = DestinationRegistry::new(store.clone())
            .ensure(
                "telegram",
                &ChannelSpec {
                    chat_name: Some("animestele".to_string()),
                    chat_id: Some(-100),
                    description: None,
                },
            )
            .unwrap();
        let destination = Destination {
            platform: "telegram".to_string(),
            chat: channel.chat_ref().unwrap(),
        };

        let mut catalog = MockSourceCatalogReader::new();
        catalog
            .expect_list_releases()
            .returning(|page| Ok(if page == 1 { listing(1, 2) } else { Vec::new() }));
        catalog.expect_list_watch_links().returning(|_, source_id| {
            Ok(vec![WatchLink {
                source_id,
                ordinal: 1,
                watch_link: format!("https://catalog.test/w/{}/1", source_id),
            }])
        });
        catalog.expect_list_download_links().returning(|_, source_id| {
            Ok(vec![DownloadLink {
                source_id,
                ordinal: 1,
                hd_link: Some(format!("https://cdn.test/mp4/{}-1.mp4", source_id)),
                sd_link: None,
                temporary: false,
            }])
        });
        let mut publisher = MockChannelPublisher::new();
        publisher.expect_send_text().times(4).returning(|_, _| Ok(10));
        let pipeline = pipeline(catalog, publisher, store.clone());

        let report = pipeline.run(1, 10, &destination).await.unwrap();
        let again = pipeline.run(1, 10, &destination).await.unwrap();

        assert_eq!(report.animes.published.len(), 2);
        assert_eq!(report.episodes.published.len(), 2);
        assert!(report.ingestion.new_animes.iter().all(|a| !a.added_to.is_empty()));
        assert!(again.ingestion.is_empty());
        assert_eq!(store.stats().unwrap().publication_count, 4);
    }

    #[tokio::test]
    async fn test_publish_without_publisher_is_config_error() {
        let catalog: Arc<dyn SourceCatalogReader> = Arc::new(MockSourceCatalogReader::new());
        let store = memory_store();
        let pipeline = Pipeline::new(
            Arc::clone(&catalog),
            IngestionCoordinator::new(
                catalog,
                Arc::new(MockMetadataResolver::new()),
                store,
                Arc::new(EventBus::new()),
            ),
        );
        let destination = Destination {
            platform: "telegram".to_string(),
            chat: ChatRef::Name("animestele".to_string()),
        };

        let err = pipeline.publish_pending(&destination).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_ingest_url_rejects_non_detail_url() {
        let pipeline = pipeline(
            MockSourceCatalogReader::new(),
            MockChannelPublisher::new(),
            memory_store(),
        );
        assert!(pipeline.ingest_url("https://").await.is_err());
    }
}
