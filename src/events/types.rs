// src/events/types.rs
//
// Domain events of the ingestion and publication pipeline.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{AnimeId, ChannelId, EpisodeId, PublicationTarget};

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

macro_rules! impl_domain_event {
    ($name:ident) => {
        impl DomainEvent for $name {
            fn event_id(&self) -> Uuid {
                self.event_id
            }
            fn occurred_at(&self) -> DateTime<Utc> {
                self.occurred_at
            }
            fn event_type(&self) -> &'static str {
                stringify!($name)
            }
        }
    };
}

// ============================================================================
// INGESTION EVENTS
// ============================================================================

/// Emitted when a previously unknown anime is inserted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeIngested {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub anime_id: AnimeId,
    pub source_id: i64,
    pub title: String,
}

impl AnimeIngested {
    pub fn new(anime_id: AnimeId, source_id: i64, title: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            anime_id,
            source_id,
            title,
        }
    }
}

impl_domain_event!(AnimeIngested);

/// Emitted when a previously unknown episode is inserted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeIngested {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub episode_id: EpisodeId,
    pub anime_id: AnimeId,
    pub episode_number: u32,
}

impl EpisodeIngested {
    pub fn new(episode_id: EpisodeId, anime_id: AnimeId, episode_number: u32) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            episode_id,
            anime_id,
            episode_number,
        }
    }
}

impl_domain_event!(EpisodeIngested);

/// Emitted once per `ingest` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionCompleted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub entries: usize,
    pub new_animes: usize,
    pub new_episodes: usize,
    pub failures: usize,
}

impl IngestionCompleted {
    pub fn new(entries: usize, new_animes: usize, new_episodes: usize, failures: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            entries,
            new_animes,
            new_episodes,
            failures,
        }
    }
}

impl_domain_event!(IngestionCompleted);

// ============================================================================
// PUBLICATION EVENTS
// ============================================================================

/// Emitted after a publication record has been stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPublished {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub target: PublicationTarget,
    pub channel_id: ChannelId,
    pub external_message_id: i64,
}

impl EntityPublished {
    pub fn new(target: PublicationTarget, channel_id: ChannelId, external_message_id: i64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            target,
            channel_id,
            external_message_id,
        }
    }
}

impl_domain_event!(EntityPublished);
