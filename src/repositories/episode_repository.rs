// src/repositories/episode_repository.rs
//
// Episode persistence

use std::sync::Arc;

use rusqlite::{params, OptionalExtension, Row, ToSql};

use super::publication_repository::load_added_to;
use super::{parse_timestamp, Repository};
use crate::db::ConnectionPool;
use crate::domain::{AnimeId, ChannelId, EntityKind, Episode, EpisodeId, EpisodeKey};
use crate::error::{AppError, AppResult};

pub trait EpisodeRepository: Repository<Episode> {
    /// All episodes of one anime ordered by episode number
    fn list_by_source(&self, source_id: i64) -> AppResult<Vec<Episode>>;

    /// Most recently inserted episodes, newest first
    fn list_recent(&self, limit: usize) -> AppResult<Vec<Episode>>;

    /// Episodes without a publication record for `channel_id`, oldest first
    fn list_unpublished(&self, channel_id: ChannelId) -> AppResult<Vec<Episode>>;
}

pub struct SqliteEpisodeRepository {
    pool: Arc<ConnectionPool>,
}

const EPISODE_COLUMNS: &str = "e.id, e.anime_id, e.source_id, e.episode_number, e.watch_link,
    e.download_link_hd, e.download_link_sd, e.temp, e.created_at";

impl SqliteEpisodeRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_episode(row: &Row) -> rusqlite::Result<Episode> {
        let created_at: String = row.get(8)?;

        Ok(Episode {
            id: Some(EpisodeId(row.get(0)?)),
            anime_id: AnimeId(row.get(1)?),
            source_id: row.get(2)?,
            episode_number: row.get(3)?,
            watch_link: row.get(4)?,
            download_link_hd: row.get(5)?,
            download_link_sd: row.get(6)?,
            temp: row.get(7)?,
            added_to: Default::default(),
            created_at: parse_timestamp(8, &created_at)?,
        })
    }

    fn query_list(&self, sql: &str, args: &[&dyn ToSql]) -> AppResult<Vec<Episode>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;

        let mut episodes = stmt
            .query_map(args, Self::row_to_episode)?
            .collect::<Result<Vec<_>, _>>()?;

        for episode in &mut episodes {
            if let Some(id) = episode.id {
                episode.added_to = load_added_to(&conn, EntityKind::Episode, id.0)?;
            }
        }

        Ok(episodes)
    }
}

impl Repository<Episode> for SqliteEpisodeRepository {
    fn find_by_natural_key(&self, key: &EpisodeKey) -> AppResult<Option<EpisodeId>> {
        let conn = self.pool.get()?;

        let id = conn
            .query_row(
                "SELECT id FROM episodes WHERE source_id = ?1 AND episode_number = ?2",
                params![key.source_id, key.episode_number],
                |row| row.get(0),
            )
            .optional()?;

        Ok(id.map(EpisodeId))
    }

    fn insert(&self, episode: &Episode) -> AppResult<EpisodeId> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO episodes (
                anime_id, source_id, episode_number, watch_link,
                download_link_hd, download_link_sd, temp, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                episode.anime_id.0,
                episode.source_id,
                episode.episode_number,
                episode.watch_link,
                episode.download_link_hd,
                episode.download_link_sd,
                episode.temp,
                episode.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| {
            AppError::from_insert(
                e,
                &format!(
                    "episode {} of source {}",
                    episode.episode_number, episode.source_id
                ),
            )
        })?;

        Ok(EpisodeId(conn.last_insert_rowid()))
    }

    fn get(&self, id: EpisodeId) -> AppResult<Option<Episode>> {
        let conn = self.pool.get()?;

        let sql = format!("SELECT {} FROM episodes e WHERE e.id = ?1", EPISODE_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let mut episode = match stmt.query_row(params![id.0], Self::row_to_episode) {
            Ok(episode) => episode,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(AppError::Database(e)),
        };

        episode.added_to = load_added_to(&conn, EntityKind::Episode, id.0)?;
        Ok(Some(episode))
    }
}

impl EpisodeRepository for SqliteEpisodeRepository {
    fn list_by_source(&self, source_id: i64) -> AppResult<Vec<Episode>> {
        let sql = format!(
            "SELECT {} FROM episodes e WHERE e.source_id = ?1 ORDER BY e.episode_number",
            EPISODE_COLUMNS
        );
        self.query_list(&sql, &[&source_id])
    }

    fn list_recent(&self, limit: usize) -> AppResult<Vec<Episode>> {
        let sql = format!(
            "SELECT {} FROM episodes e ORDER BY e.id DESC LIMIT ?1",
            EPISODE_COLUMNS
        );
        self.query_list(&sql, &[&(limit as i64)])
    }

    fn list_unpublished(&self, channel_id: ChannelId) -> AppResult<Vec<Episode>> {
        let sql = format!(
            "SELECT {} FROM episodes e
             WHERE NOT EXISTS (
                SELECT 1 FROM publication_records r
                WHERE r.entity_kind = 'episode' AND r.entity_id = e.id AND r.channel_id = ?1
             )
             ORDER BY e.source_id, e.episode_number",
            EPISODE_COLUMNS
        );
        self.query_list(&sql, &[&channel_id.0])
    }
}
