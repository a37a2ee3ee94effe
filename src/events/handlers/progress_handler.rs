// src/events/handlers/progress_handler.rs
//
// Operator-facing progress for a CLI run: counts what the pipeline
// created and published, and prints one line per publication and per
// finished ingestion batch.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::EntityKind;
use crate::events::{AnimeIngested, EntityPublished, EpisodeIngested, EventBus, IngestionCompleted};

/// Running totals fed by pipeline events
#[derive(Debug, Default)]
pub struct RunProgress {
    animes_ingested: AtomicUsize,
    episodes_ingested: AtomicUsize,
    animes_published: AtomicUsize,
    episodes_published: AtomicUsize,
    batches: AtomicUsize,
}

impl RunProgress {
    pub fn animes_ingested(&self) -> usize {
        self.animes_ingested.load(Ordering::Relaxed)
    }

    pub fn episodes_ingested(&self) -> usize {
        self.episodes_ingested.load(Ordering::Relaxed)
    }

    pub fn animes_published(&self) -> usize {
        self.animes_published.load(Ordering::Relaxed)
    }

    pub fn episodes_published(&self) -> usize {
        self.episodes_published.load(Ordering::Relaxed)
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::Relaxed)
    }
}

impl fmt::Display for RunProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} batches, {} animes / {} episodes ingested, {} animes / {} episodes published",
            self.batches(),
            self.animes_ingested(),
            self.episodes_ingested(),
            self.animes_published(),
            self.episodes_published()
        )
    }
}

// ============================================================================
// HANDLER REGISTRATION
// ============================================================================

/// Registers the progress handlers and returns the totals they update.
pub fn register_progress_handlers(bus: &EventBus) -> Arc<RunProgress> {
    let progress = Arc::new(RunProgress::default());

    let totals = Arc::clone(&progress);
    bus.subscribe::<AnimeIngested, _>(move |_| {
        totals.animes_ingested.fetch_add(1, Ordering::Relaxed);
    });

    let totals = Arc::clone(&progress);
    bus.subscribe::<EpisodeIngested, _>(move |_| {
        totals.episodes_ingested.fetch_add(1, Ordering::Relaxed);
    });

    let totals = Arc::clone(&progress);
    bus.subscribe::<EntityPublished, _>(move |event| {
        handle_entity_published(&totals, event);
    });

    let totals = Arc::clone(&progress);
    bus.subscribe::<IngestionCompleted, _>(move |event| {
        handle_ingestion_completed(&totals, event);
    });

    progress
}

fn handle_entity_published(progress: &RunProgress, event: &EntityPublished) {
    let counter = match event.target.kind() {
        EntityKind::Anime => &progress.animes_published,
        EntityKind::Episode => &progress.episodes_published,
    };
    counter.fetch_add(1, Ordering::Relaxed);

    println!(
        "[PUBLISH] {} -> channel {} (message {})",
        event.target, event.channel_id, event.external_message_id
    );
}

fn handle_ingestion_completed(progress: &RunProgress, event: &IngestionCompleted) {
    progress.batches.fetch_add(1, Ordering::Relaxed);

    println!(
        "[INGEST] {} entries: {} new animes, {} new episodes, {} failures",
        event.entries, event.new_animes, event.new_episodes, event.failures
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnimeId, ChannelId, EpisodeId, PublicationTarget};

    #[test]
    fn test_progress_counts_events() {
        let bus = EventBus::new();
        let progress = register_progress_handlers(&bus);

        bus.emit(AnimeIngested::new(AnimeId(1), 52991, "Frieren".to_string()));
        bus.emit(EpisodeIngested::new(EpisodeId(1), AnimeId(1), 1));
        bus.emit(EpisodeIngested::new(EpisodeId(2), AnimeId(1), 2));
        bus.emit(EntityPublished::new(PublicationTarget::Anime(AnimeId(1)), ChannelId(1), 10));
        bus.emit(EntityPublished::new(PublicationTarget::Episode(EpisodeId(2)), ChannelId(1), 11));
        bus.emit(IngestionCompleted::new(1, 1, 2, 0));

        assert_eq!(progress.animes_ingested(), 1);
        assert_eq!(progress.episodes_ingested(), 2);
        assert_eq!(progress.animes_published(), 1);
        assert_eq!(progress.episodes_published(), 1);
        assert_eq!(progress.batches(), 1);
        assert_eq!(
            progress.to_string(),
            "1 batches, 1 animes / 2 episodes ingested, 1 animes / 1 episodes published"
        );
    }
}
