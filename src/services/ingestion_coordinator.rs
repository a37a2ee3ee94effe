// src/services/ingestion_coordinator.rs
//
// Turns a scraped catalog batch into newly stored Anime and Episode rows.
//
// RULES:
// - The store decides what is new; nothing is cached between calls
// - Unresolvable titles are skipped, never fatal
// - Insert conflicts are re-checked and treated as "already exists"
// - Only a store failure aborts the batch

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{
    Anime, CatalogEntry, DomainError, Entity, EpisodeCandidate, Episode, EpisodeKey,
};
use crate::error::{AppError, AppResult};
use crate::events::{AnimeIngested, EpisodeIngested, EventBus, IngestionCompleted};
use crate::ports::{MetadataResolver, SourceCatalogReader};
use crate::repositories::EntityStore;
use crate::services::link_merger::LinkMerger;
use crate::services::report::ItemFailure;

/// Entities created by one `ingest` call.
///
/// Empty `new_*` lists mean nothing new was created, not that nothing
/// exists.
#[derive(Debug, Default)]
pub struct IngestionReport {
    pub new_animes: Vec<Anime>,
    pub new_episodes: Vec<Episode>,
    /// Titles the metadata provider could not resolve
    pub unresolved: Vec<String>,
    pub failures: Vec<ItemFailure>,
}

impl IngestionReport {
    pub fn is_empty(&self) -> bool {
        self.new_animes.is_empty() && self.new_episodes.is_empty()
    }
}

pub struct IngestionCoordinator {
    catalog: Arc<dyn SourceCatalogReader>,
    resolver: Arc<dyn MetadataResolver>,
    store: EntityStore,
    event_bus: Arc<EventBus>,
}

impl IngestionCoordinator {
    pub fn new(
        catalog: Arc<dyn SourceCatalogReader>,
        resolver: Arc<dyn MetadataResolver>,
        store: EntityStore,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            catalog,
            resolver,
            store,
            event_bus,
        }
    }

    pub async fn ingest(&self, batch: &[CatalogEntry]) -> AppResult<IngestionReport> {
        let mut report = IngestionReport::default();

        // 1. Resolve canonical ids and store unknown animes
        let mut resolved: Vec<(&CatalogEntry, i64)> = Vec::new();
        let mut seen = HashSet::new();
        for entry in batch {
            match self.resolve_entry(entry, &mut report).await {
                Ok(Some(source_id)) => {
                    if seen.insert(source_id) {
                        resolved.push((entry, source_id));
                    } else {
                        log::debug!(
                            "'{}' resolves to source {} already in this batch",
                            entry.title,
                            source_id
                        );
                    }
                }
                Ok(None) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => report.failures.push(ItemFailure::new(entry.title.clone(), err)),
            }
        }

        // 2. Scrape and merge links of every resolved anime
        let mut candidates: Vec<EpisodeCandidate> = Vec::new();
        for (entry, source_id) in &resolved {
            match self.collect_candidates(entry, *source_id).await {
                Ok((mut merged, mismatch)) => {
                    candidates.append(&mut merged);
                    if let Some(err) = mismatch {
                        report
                            .failures
                            .push(ItemFailure::new(entry.title.clone(), err.into()));
                    }
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => report.failures.push(ItemFailure::new(entry.title.clone(), err)),
            }
        }

        // 3. Store unknown episodes
        for candidate in candidates {
            let subject = format!(
                "episode {} of source {}",
                candidate.episode_number, candidate.source_id
            );
            match self.store_episode(candidate) {
                Ok(Some(episode)) => report.new_episodes.push(episode),
                Ok(None) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => report.failures.push(ItemFailure::new(subject, err)),
            }
        }

        log::info!(
            "Ingested {} entries: {} new animes, {} new episodes, {} unresolved, {} failures",
            batch.len(),
            report.new_animes.len(),
            report.new_episodes.len(),
            report.unresolved.len(),
            report.failures.len()
        );
        self.event_bus.emit(IngestionCompleted::new(
            batch.len(),
            report.new_animes.len(),
            report.new_episodes.len(),
            report.failures.len(),
        ));

        Ok(report)
    }

    /// Canonical id of `entry`, inserting the anime when it is unknown.
    /// `Ok(None)` means the entry is skipped.
    async fn resolve_entry(
        &self,
        entry: &CatalogEntry,
        report: &mut IngestionReport,
    ) -> AppResult<Option<i64>> {
        let Some(source_id) = self.resolver.search(&entry.title).await? else {
            log::warn!("No metadata match for '{}', skipping", entry.title);
            report.unresolved.push(entry.title.clone());
            return Ok(None);
        };

        if let Some(existing) = self.store.animes.find_by_natural_key(&source_id)? {
            log::info!("Anime {} already exists (id {})", source_id, existing);
            return Ok(Some(source_id));
        }

        let Some(mut metadata) = self.resolver.fetch(source_id).await? else {
            log::warn!("No metadata record for source {} ('{}'), skipping", source_id, entry.title);
            report.unresolved.push(entry.title.clone());
            return Ok(None);
        };
        // The id we looked up is the identity; ignore what the record echoes back
        metadata.source_id = source_id;

        let anime = Anime::from_metadata(metadata)?;
        match self.store.animes.insert(&anime) {
            Ok(id) => {
                let anime = anime.with_id(id);
                log::info!("New anime {} '{}' (id {})", source_id, anime.title, id);
                self.event_bus
                    .emit(AnimeIngested::new(id, source_id, anime.title.clone()));
                report.new_animes.push(anime);
                Ok(Some(source_id))
            }
            Err(AppError::AlreadyExists(detail)) => {
                match self.store.animes.find_by_natural_key(&source_id)? {
                    Some(existing) => {
                        log::info!("Anime {} already exists (id {})", source_id, existing);
                        Ok(Some(source_id))
                    }
                    None => {
                        // Same title stored under another source id
                        log::warn!("Anime {} conflicts with a stored anime: {}", source_id, detail);
                        Ok(None)
                    }
                }
            }
            Err(err) => Err(err),
        }
    }

    async fn collect_candidates(
        &self,
        entry: &CatalogEntry,
        source_id: i64,
    ) -> AppResult<(Vec<EpisodeCandidate>, Option<DomainError>)> {
        let watch = self
            .catalog
            .list_watch_links(&entry.detail_href, source_id)
            .await?;
        let download = self
            .catalog
            .list_download_links(&entry.catalog_name, source_id)
            .await?;

        log::debug!(
            "Source {}: {} watch links, {} download links",
            source_id,
            watch.len(),
            download.len()
        );

        Ok(LinkMerger::merge(watch, download).into_prefix())
    }

    /// Insert the candidate unless its natural key is already stored.
    fn store_episode(&self, candidate: EpisodeCandidate) -> AppResult<Option<Episode>> {
        let key = EpisodeKey {
            source_id: candidate.source_id,
            episode_number: candidate.episode_number,
        };

        let anime_id = self
            .store
            .animes
            .find_by_natural_key(&candidate.source_id)?
            .ok_or_else(|| AppError::NotFound(format!("anime {}", candidate.source_id)))?;

        if let Some(existing) = self.store.episodes.find_by_natural_key(&key)? {
            log::info!(
                "Episode {} of source {} already exists (id {})",
                key.episode_number,
                key.source_id,
                existing
            );
            return Ok(None);
        }

        let episode = Episode::from_candidate(anime_id, candidate)?;
        match self.store.episodes.insert(&episode) {
            Ok(id) => {
                log::info!(
                    "New episode {} of source {} (id {})",
                    key.episode_number,
                    key.source_id,
                    id
                );
                self.event_bus
                    .emit(EpisodeIngested::new(id, anime_id, key.episode_number));
                Ok(Some(episode.with_id(id)))
            }
            Err(AppError::AlreadyExists(detail)) => {
                match self.store.episodes.find_by_natural_key(&episode.natural_key())? {
                    Some(existing) => log::info!(
                        "Episode {} of source {} already exists (id {})",
                        key.episode_number,
                        key.source_id,
                        existing
                    ),
                    None => log::warn!(
                        "Episode {} of source {} shares a link with a stored episode: {}",
                        key.episode_number,
                        key.source_id,
                        detail
                    ),
                }
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
