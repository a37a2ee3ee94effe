// src/repositories/anime_repository.rs
//
// Anime persistence

use std::sync::Arc;

use rusqlite::{params, OptionalExtension, Row};

use super::publication_repository::load_added_to;
use super::{parse_string_list, parse_timestamp, Repository};
use crate::db::ConnectionPool;
use crate::domain::{Anime, AnimeId, ChannelId, EntityKind};
use crate::error::{AppError, AppResult};

pub trait AnimeRepository: Repository<Anime> {
    /// Most recently inserted animes, newest first
    fn list_recent(&self, limit: usize) -> AppResult<Vec<Anime>>;

    /// Animes without a publication record for `channel_id`, oldest first
    fn list_unpublished(&self, channel_id: ChannelId) -> AppResult<Vec<Anime>>;
}

pub struct SqliteAnimeRepository {
    pool: Arc<ConnectionPool>,
}

const ANIME_COLUMNS: &str = "a.id, a.source_id, a.title, a.title_english, a.title_japanese,
    a.kind, a.episodes, a.status, a.airing, a.aired, a.rating, a.duration, a.season,
    a.year, a.studios, a.producers, a.synopsis, a.created_at";

impl SqliteAnimeRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Map database row to Anime; `added_to` is filled in separately
    fn row_to_anime(row: &Row) -> rusqlite::Result<Anime> {
        let studios: String = row.get(14)?;
        let producers: String = row.get(15)?;
        let created_at: String = row.get(17)?;

        Ok(Anime {
            id: Some(AnimeId(row.get(0)?)),
            source_id: row.get(1)?,
            title: row.get(2)?,
            title_english: row.get(3)?,
            title_japanese: row.get(4)?,
            kind: row.get(5)?,
            episodes: row.get(6)?,
            status: row.get(7)?,
            airing: row.get(8)?,
            aired: row.get(9)?,
            rating: row.get(10)?,
            duration: row.get(11)?,
            season: row.get(12)?,
            year: row.get(13)?,
            studios: parse_string_list(14, &studios)?,
            producers: parse_string_list(15, &producers)?,
            synopsis: row.get(16)?,
            added_to: Default::default(),
            created_at: parse_timestamp(17, &created_at)?,
        })
    }

    fn query_list(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> AppResult<Vec<Anime>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;

        let mut animes = stmt
            .query_map(args, Self::row_to_anime)?
            .collect::<Result<Vec<_>, _>>()?;

        for anime in &mut animes {
            if let Some(id) = anime.id {
                anime.added_to = load_added_to(&conn, EntityKind::Anime, id.0)?;
            }
        }

        Ok(animes)
    }
}

impl Repository<Anime> for SqliteAnimeRepository {
    fn find_by_natural_key(&self, source_id: &i64) -> AppResult<Option<AnimeId>> {
        let conn = self.pool.get()?;

        let id = conn
            .query_row(
                "SELECT id FROM animes WHERE source_id = ?1",
                params![source_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(id.map(AnimeId))
    }

    fn insert(&self, anime: &Anime) -> AppResult<AnimeId> {
        let conn = self.pool.get()?;

        let studios = serde_json::to_string(&anime.studios)?;
        let producers = serde_json::to_string(&anime.producers)?;

        conn.execute(
            "INSERT INTO animes (
                source_id, title, title_english, title_japanese, kind, episodes,
                status, airing, aired, rating, duration, season, year,
                studios, producers, synopsis, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                anime.source_id,
                anime.title,
                anime.title_english,
                anime.title_japanese,
                anime.kind,
                anime.episodes,
                anime.status,
                anime.airing,
                anime.aired,
                anime.rating,
                anime.duration,
                anime.season,
                anime.year,
                studios,
                producers,
                anime.synopsis,
                anime.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| AppError::from_insert(e, &format!("anime {}", anime.source_id)))?;

        Ok(AnimeId(conn.last_insert_rowid()))
    }

    fn get(&self, id: AnimeId) -> AppResult<Option<Anime>> {
        let conn = self.pool.get()?;

        let sql = format!("SELECT {} FROM animes a WHERE a.id = ?1", ANIME_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let mut anime = match stmt.query_row(params![id.0], Self::row_to_anime) {
            Ok(anime) => anime,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(AppError::Database(e)),
        };

        anime.added_to = load_added_to(&conn, EntityKind::Anime, id.0)?;
        Ok(Some(anime))
    }
}

impl AnimeRepository for SqliteAnimeRepository {
    fn list_recent(&self, limit: usize) -> AppResult<Vec<Anime>> {
        let sql = format!(
            "SELECT {} FROM animes a ORDER BY a.id DESC LIMIT ?1",
            ANIME_COLUMNS
        );
        self.query_list(&sql, &[&(limit as i64)])
    }

    fn list_unpublished(&self, channel_id: ChannelId) -> AppResult<Vec<Anime>> {
        let sql = format!(
            "SELECT {} FROM animes a
             WHERE NOT EXISTS (
                SELECT 1 FROM publication_records r
                WHERE r.entity_kind = 'anime' AND r.entity_id = a.id AND r.channel_id = ?1
             )
             ORDER BY a.id",
            ANIME_COLUMNS
        );
        self.query_list(&sql, &[&channel_id.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, initialize_database};
    use crate::domain::AnimeMetadata;

    fn repo() -> SqliteAnimeRepository {
        let pool = create_memory_pool().unwrap();
        initialize_database(&pool.get().unwrap()).unwrap();
        SqliteAnimeRepository::new(Arc::new(pool))
    }

    fn anime(source_id: i64, title: &str) -> Anime {
        Anime::from_metadata(AnimeMetadata {
            source_id,
            title: title.to_string(),
            kind: Some("TV".to_string()),
            episodes: Some(28),
            airing: Some(true),
            year: Some(2023),
            studios: vec!["Madhouse".to_string()],
            producers: vec!["Aniplex".to_string(), "Dentsu".to_string()],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_insert_then_get_round_trips_fields() {
        let repo = repo();
        let original = anime(52991, "Sousou no Frieren");

        let id = repo.insert(&original).unwrap();
        let stored = repo.get(id).unwrap().unwrap();

        assert_eq!(stored.id, Some(id));
        assert_eq!(stored.title, "Sousou no Frieren");
        assert_eq!(stored.episodes, Some(28));
        assert_eq!(stored.airing, Some(true));
        assert_eq!(stored.producers, vec!["Aniplex", "Dentsu"]);
        assert_eq!(stored.added_to.to_string(), "#none");
    }

    #[test]
    fn test_find_by_natural_key() {
        let repo = repo();
        assert_eq!(repo.find_by_natural_key(&52991).unwrap(), None);

        let id = repo.insert(&anime(52991, "Sousou no Frieren")).unwrap();
        assert_eq!(repo.find_by_natural_key(&52991).unwrap(), Some(id));
    }

    #[test]
    fn test_duplicate_source_id_or_title_is_already_exists() {
        let repo = repo();
        repo.insert(&anime(52991, "Sousou no Frieren")).unwrap();

        let same_source = repo.insert(&anime(52991, "Frieren"));
        let same_title = repo.insert(&anime(1, "Sousou no Frieren"));

        assert!(matches!(same_source, Err(AppError::AlreadyExists(_))));
        assert!(matches!(same_title, Err(AppError::AlreadyExists(_))));
    }

    #[test]
    fn test_get_missing_is_none() {
        assert!(repo().get(AnimeId(404)).unwrap().is_none());
    }

    #[test]
    fn test_list_recent_is_newest_first() {
        let repo = repo();
        repo.insert(&anime(1, "Monster")).unwrap();
        repo.insert(&anime(2, "Mushishi")).unwrap();
        repo.insert(&anime(3, "Planetes")).unwrap();

        let recent = repo.list_recent(2).unwrap();
        let titles: Vec<&str> = recent.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Planetes", "Mushishi"]);
    }
}
