// src/events/mod.rs
//
// Internal Event System - Public API

pub mod bus;
pub mod handlers;
pub mod types;

pub use bus::EventBus;
pub use handlers::{register_progress_handlers, RunProgress};
pub use types::{AnimeIngested, DomainEvent, EntityPublished, EpisodeIngested, IngestionCompleted};
