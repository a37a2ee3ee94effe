// src/lib.rs
// AnimesTele - anime release ingestion and channel publication
//
// Architecture:
// - Domain-centric: identities and invariants live in the domain module
// - Store as truth: uniqueness is enforced by the database, not by callers
// - Ports and adapters: the pipeline only sees capability traits
// - Explicit: a batch never aborts on one bad item, only on store failure

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod repositories;

// ============================================================================
// PIPELINE
// ============================================================================

pub mod ports;
pub mod services;

// ============================================================================
// OUTER LAYER
// ============================================================================

pub mod config;
pub mod integrations;
pub mod logging;

// ============================================================================
// PUBLIC API - Domain Entities
// ============================================================================

pub use domain::{
    // Anime
    Anime,
    AnimeId,
    AnimeMetadata,
    // Catalog records
    CatalogEntry,
    // Destinations
    Channel,
    ChannelId,
    ChatRef,
    DomainError,
    DownloadLink,
    // Episode
    Episode,
    EpisodeCandidate,
    EpisodeId,
    Platform,
    PlatformId,
    // Publication
    PublicationRecord,
    PublicationTarget,
    WatchLink,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    AnimeIngested, DomainEvent, EntityPublished, EpisodeIngested, EventBus, IngestionCompleted,
};

// ============================================================================
// PUBLIC API - Store
// ============================================================================

pub use repositories::{
    AnimeRepository, ChannelRepository, EntityStore, EpisodeRepository, PlatformRepository,
    PublicationRepository, Repository,
};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    DestinationRegistry, IngestionCoordinator, IngestionReport, LinkMerger, Pipeline,
    PublicationTracker, PublishOptions, RetryPolicy,
};

pub use config::Config;
