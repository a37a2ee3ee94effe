// src/repositories/publication_repository.rs
//
// Publication record persistence

use std::str::FromStr;
use std::sync::Arc;

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{parse_timestamp, Repository};
use crate::db::ConnectionPool;
use crate::domain::{
    AddedTo, ChannelId, EntityKind, PublicationId, PublicationKey, PublicationMarker,
    PublicationRecord, PublicationTarget,
};
use crate::error::{AppError, AppResult};

pub trait PublicationRepository: Repository<PublicationRecord> {
    /// Every record of one entity across all channels, oldest first
    fn list_for_target(&self, target: PublicationTarget) -> AppResult<Vec<PublicationRecord>>;
}

pub struct SqlitePublicationRepository {
    pool: Arc<ConnectionPool>,
}

impl SqlitePublicationRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &Row) -> rusqlite::Result<PublicationRecord> {
        let kind_str: String = row.get(1)?;
        let kind = EntityKind::from_str(&kind_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
        let created_at: String = row.get(5)?;

        Ok(PublicationRecord {
            id: Some(PublicationId(row.get(0)?)),
            target: PublicationTarget::from_parts(kind, row.get(2)?),
            channel_id: ChannelId(row.get(3)?),
            external_message_id: row.get(4)?,
            created_at: parse_timestamp(5, &created_at)?,
        })
    }
}

impl Repository<PublicationRecord> for SqlitePublicationRepository {
    fn find_by_natural_key(&self, key: &PublicationKey) -> AppResult<Option<PublicationId>> {
        let conn = self.pool.get()?;

        let id = conn
            .query_row(
                "SELECT id FROM publication_records
                 WHERE entity_kind = ?1 AND entity_id = ?2 AND channel_id = ?3",
                params![
                    key.target.kind().as_str(),
                    key.target.entity_id(),
                    key.channel_id.0
                ],
                |row| row.get(0),
            )
            .optional()?;

        Ok(id.map(PublicationId))
    }

    fn insert(&self, record: &PublicationRecord) -> AppResult<PublicationId> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO publication_records (
                entity_kind, entity_id, channel_id, external_message_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.target.kind().as_str(),
                record.target.entity_id(),
                record.channel_id.0,
                record.external_message_id,
                record.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| {
            AppError::from_insert(
                e,
                &format!("publication of {} to channel {}", record.target, record.channel_id),
            )
        })?;

        Ok(PublicationId(conn.last_insert_rowid()))
    }

    fn get(&self, id: PublicationId) -> AppResult<Option<PublicationRecord>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, entity_kind, entity_id, channel_id, external_message_id, created_at
             FROM publication_records WHERE id = ?1",
        )?;

        match stmt.query_row(params![id.0], Self::row_to_record) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }
}

impl PublicationRepository for SqlitePublicationRepository {
    fn list_for_target(&self, target: PublicationTarget) -> AppResult<Vec<PublicationRecord>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, entity_kind, entity_id, channel_id, external_message_id, created_at
             FROM publication_records
             WHERE entity_kind = ?1 AND entity_id = ?2
             ORDER BY id",
        )?;

        let records = stmt
            .query_map(
                params![target.kind().as_str(), target.entity_id()],
                Self::row_to_record,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

/// Render the `added_to` diagnostic view of an entity from its records.
pub(crate) fn load_added_to(
    conn: &Connection,
    kind: EntityKind,
    entity_id: i64,
) -> rusqlite::Result<AddedTo> {
    let mut stmt = conn.prepare(
        "SELECT p.name, r.external_message_id
         FROM publication_records r
         JOIN channels c ON c.id = r.channel_id
         JOIN platforms p ON p.id = c.platform_id
         WHERE r.entity_kind = ?1 AND r.entity_id = ?2
         ORDER BY r.id",
    )?;

    let markers = stmt
        .query_map(params![kind.as_str(), entity_id], |row| {
            Ok(PublicationMarker {
                destination: row.get(0)?,
                message_id: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AddedTo::from(markers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, initialize_database};
    use crate::domain::{AnimeId, Entity, EpisodeId};

    fn pool_with_channel() -> Arc<ConnectionPool> {
        let pool = create_memory_pool().unwrap();
        {
            let conn = pool.get().unwrap();
            initialize_database(&conn).unwrap();
            conn.execute_batch(
                "INSERT INTO platforms (id, name, created_at)
                     VALUES (1, 'telegram', '2024-01-01T00:00:00+00:00');
                 INSERT INTO channels (id, platform_id, chat_name, created_at)
                     VALUES (1, 1, 'animestele', '2024-01-01T00:00:00+00:00');",
            )
            .unwrap();
        }
        Arc::new(pool)
    }

    #[test]
    fn test_second_record_for_same_pair_is_already_exists() {
        let repo = SqlitePublicationRepository::new(pool_with_channel());
        let record = PublicationRecord::new(PublicationTarget::Anime(AnimeId(5)), ChannelId(1), 77);

        let id = repo.insert(&record).unwrap();
        let again = repo.insert(&PublicationRecord::new(record.target, ChannelId(1), 78));

        assert!(matches!(again, Err(AppError::AlreadyExists(_))));
        assert_eq!(repo.find_by_natural_key(&record.natural_key()).unwrap(), Some(id));
    }

    #[test]
    fn test_same_id_different_kind_is_distinct() {
        let repo = SqlitePublicationRepository::new(pool_with_channel());

        repo.insert(&PublicationRecord::new(PublicationTarget::Anime(AnimeId(5)), ChannelId(1), 1))
            .unwrap();
        repo.insert(&PublicationRecord::new(
            PublicationTarget::Episode(EpisodeId(5)),
            ChannelId(1),
            2,
        ))
            .unwrap();

        let records = repo.list_for_target(PublicationTarget::Episode(EpisodeId(5))).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].external_message_id, 2);
    }

    #[test]
    fn test_get_and_added_to_view() {
        let pool = pool_with_channel();
        let repo = SqlitePublicationRepository::new(Arc::clone(&pool));
        let id = repo
            .insert(&PublicationRecord::new(
                PublicationTarget::Anime(AnimeId(3)),
                ChannelId(1),
                501,
            ))
            .unwrap();

        let fetched = repo.get(id).unwrap().unwrap();
        assert_eq!(fetched.target, PublicationTarget::Anime(AnimeId(3)));
        assert!(repo.get(PublicationId(999)).unwrap().is_none());

        let conn = pool.get().unwrap();
        let added_to = load_added_to(&conn, EntityKind::Anime, 3).unwrap();
        assert_eq!(added_to.to_string(), "#telegram=501");
    }

    #[test]
    fn test_unknown_channel_is_not_found() {
        let repo = SqlitePublicationRepository::new(pool_with_channel());
        let result =
            repo.insert(&PublicationRecord::new(
                PublicationTarget::Anime(AnimeId(1)),
                ChannelId(42),
                1,
            ));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
