// src/repositories/store.rs
//
// EntityStore: the bundle of repositories the pipeline services share.
// The store is the single source of truth for "have we seen this before".

use std::sync::Arc;

use super::{
    AnimeRepository, ChannelRepository, EpisodeRepository, PlatformRepository,
    PublicationRepository, SqliteAnimeRepository, SqliteChannelRepository,
    SqliteEpisodeRepository, SqlitePlatformRepository, SqlitePublicationRepository,
};
use crate::db::{
    get_connection, get_database_stats, verify_database_integrity, ConnectionPool, DatabaseStats,
};
use crate::error::AppResult;

#[derive(Clone)]
pub struct EntityStore {
    pub animes: Arc<dyn AnimeRepository>,
    pub episodes: Arc<dyn EpisodeRepository>,
    pub platforms: Arc<dyn PlatformRepository>,
    pub channels: Arc<dyn ChannelRepository>,
    pub publications: Arc<dyn PublicationRepository>,
    pool: Arc<ConnectionPool>,
}

impl EntityStore {
    /// SQLite-backed store over an already initialized pool
    pub fn sqlite(pool: Arc<ConnectionPool>) -> Self {
        Self {
            animes: Arc::new(SqliteAnimeRepository::new(Arc::clone(&pool))),
            episodes: Arc::new(SqliteEpisodeRepository::new(Arc::clone(&pool))),
            platforms: Arc::new(SqlitePlatformRepository::new(Arc::clone(&pool))),
            channels: Arc::new(SqliteChannelRepository::new(Arc::clone(&pool))),
            publications: Arc::new(SqlitePublicationRepository::new(Arc::clone(&pool))),
            pool,
        }
    }

    pub fn stats(&self) -> AppResult<DatabaseStats> {
        let conn = get_connection(&self.pool)?;
        get_database_stats(&conn)
    }

    pub fn verify_integrity(&self) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        verify_database_integrity(&conn)
    }
}
