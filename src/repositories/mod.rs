// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic, NO event emission
// - Uniqueness is enforced by the schema; conflicts surface as AlreadyExists
// - Every call takes a pooled connection and releases it before returning
// - Explicit SQL only

pub mod anime_repository;
pub mod channel_repository;
pub mod episode_repository;
pub mod platform_repository;
pub mod publication_repository;
pub mod store;

pub use anime_repository::{AnimeRepository, SqliteAnimeRepository};
pub use channel_repository::{ChannelRepository, SqliteChannelRepository};
pub use episode_repository::{EpisodeRepository, SqliteEpisodeRepository};
pub use platform_repository::{PlatformRepository, SqlitePlatformRepository};
pub use publication_repository::{PublicationRepository, SqlitePublicationRepository};
pub use store::EntityStore;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;

use crate::domain::Entity;
use crate::error::AppResult;

/// Storage contract shared by every entity kind.
///
/// `insert` is atomic with its uniqueness check and reports a conflict as
/// `AppError::AlreadyExists`, so callers may insert speculatively.
pub trait Repository<E: Entity>: Send + Sync {
    fn find_by_natural_key(&self, key: &E::Key) -> AppResult<Option<E::Id>>;
    fn insert(&self, entity: &E) -> AppResult<E::Id>;
    fn get(&self, id: E::Id) -> AppResult<Option<E>>;
}

/// Parse an RFC 3339 column written by this layer.
pub(crate) fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

/// Decode a JSON string-array column.
pub(crate) fn parse_string_list(column: usize, value: &str) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}
