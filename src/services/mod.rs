// src/services/mod.rs
//
// Services Module - Orchestration Layer
//
// Services coordinate ports, repositories and events. Domain rules stay in
// the domain module; the store enforces uniqueness.

pub mod destination_registry;
pub mod ingestion_coordinator;
pub mod link_merger;
pub mod message_format;
pub mod pipeline;
pub mod publication_tracker;
pub mod report;
pub mod retry;

pub use destination_registry::{ChannelSpec, DestinationRegistry};
pub use ingestion_coordinator::{IngestionCoordinator, IngestionReport};
pub use link_merger::{LinkMerger, MergedEpisodes};
pub use message_format::{render_anime, render_episode};
pub use pipeline::{Destination, Pipeline, RunReport, HARD_EXTRACT_LIMIT};
pub use publication_tracker::{
    EpisodeDelivery, MessagePayload, PublicationSummary, PublicationTracker, Publishable,
    PublishOptions, PublishOutcome,
};
pub use report::ItemFailure;
pub use retry::RetryPolicy;
