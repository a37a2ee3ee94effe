// src/repositories/channel_repository.rs
//
// Channel persistence

use std::sync::Arc;

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_timestamp, Repository};
use crate::db::ConnectionPool;
use crate::domain::{Channel, ChannelId, ChannelKey, ChatRef, PlatformId};
use crate::error::{AppError, AppResult};

pub trait ChannelRepository: Repository<Channel> {
    fn list_by_platform(&self, platform_id: PlatformId) -> AppResult<Vec<Channel>>;
}

pub struct SqliteChannelRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteChannelRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_channel(row: &Row) -> rusqlite::Result<Channel> {
        let created_at: String = row.get(5)?;
        Ok(Channel {
            id: Some(ChannelId(row.get(0)?)),
            platform_id: PlatformId(row.get(1)?),
            chat_name: row.get(2)?,
            chat_id: row.get(3)?,
            description: row.get(4)?,
            created_at: parse_timestamp(5, &created_at)?,
        })
    }
}

impl Repository<Channel> for SqliteChannelRepository {
    fn find_by_natural_key(&self, key: &ChannelKey) -> AppResult<Option<ChannelId>> {
        let conn = self.pool.get()?;

        let id = match &key.chat {
            ChatRef::Id(chat_id) => conn
                .query_row(
                    "SELECT id FROM channels WHERE platform_id = ?1 AND chat_id = ?2",
                    params![key.platform_id.0, chat_id],
                    |row| row.get(0),
                )
                .optional()?,
            ChatRef::Name(chat_name) => conn
                .query_row(
                    "SELECT id FROM channels WHERE platform_id = ?1 AND chat_name = ?2",
                    params![key.platform_id.0, chat_name.trim_start_matches('@')],
                    |row| row.get(0),
                )
                .optional()?,
        };

        Ok(id.map(ChannelId))
    }

    fn insert(&self, channel: &Channel) -> AppResult<ChannelId> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO channels (platform_id, chat_name, chat_id, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                channel.platform_id.0,
                channel.chat_name,
                channel.chat_id,
                channel.description,
                channel.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| AppError::from_insert(e, &format!("channel {:?}", channel.chat_ref())))?;

        Ok(ChannelId(conn.last_insert_rowid()))
    }

    fn get(&self, id: ChannelId) -> AppResult<Option<Channel>> {
        let conn = self.pool.get()?;

        let channel = conn
            .query_row(
                "SELECT id, platform_id, chat_name, chat_id, description, created_at
                 FROM channels WHERE id = ?1",
                params![id.0],
                Self::row_to_channel,
            )
            .optional()?;

        Ok(channel)
    }
}

impl ChannelRepository for SqliteChannelRepository {
    fn list_by_platform(&self, platform_id: PlatformId) -> AppResult<Vec<Channel>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, platform_id, chat_name, chat_id, description, created_at
             FROM channels WHERE platform_id = ?1 ORDER BY id",
        )?;

        let channels = stmt
            .query_map(params![platform_id.0], Self::row_to_channel)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, initialize_database};

    fn repo() -> SqliteChannelRepository {
        let pool = create_memory_pool().unwrap();
        {
            let conn = pool.get().unwrap();
            initialize_database(&conn).unwrap();
            conn.execute(
                "INSERT INTO platforms (id, name, created_at)
                 VALUES (1, 'telegram', '2024-01-01T00:00:00+00:00')",
                [],
            )
            .unwrap();
        }
        SqliteChannelRepository::new(Arc::new(pool))
    }

    #[test]
    fn test_lookup_by_either_identity() {
        let repo = repo();
        let channel = Channel::new(
            PlatformId(1),
            Some("animestele".to_string()),
            Some(-1002039517569),
            Some("releases".to_string()),
        )
        .unwrap();
        let id = repo.insert(&channel).unwrap();

        let by_id = ChannelKey { platform_id: PlatformId(1), chat: ChatRef::Id(-1002039517569) };
        let by_name = ChannelKey {
            platform_id: PlatformId(1),
            chat: ChatRef::Name("@animestele".to_string()),
        };

        assert_eq!(repo.find_by_natural_key(&by_id).unwrap(), Some(id));
        assert_eq!(repo.find_by_natural_key(&by_name).unwrap(), Some(id));
        assert_eq!(repo.list_by_platform(PlatformId(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_chat_name_is_already_exists() {
        let repo = repo();
        repo.insert(&Channel::new(PlatformId(1), Some("a".to_string()), None, None).unwrap())
            .unwrap();

        let dup = Channel::new(PlatformId(1), Some("a".to_string()), Some(5), None).unwrap();
        assert!(matches!(repo.insert(&dup), Err(AppError::AlreadyExists(_))));
    }

    #[test]
    fn test_unknown_platform_is_not_found() {
        let repo = repo();
        let channel = Channel::new(PlatformId(9), None, Some(5), None).unwrap();
        assert!(matches!(repo.insert(&channel), Err(AppError::NotFound(_))));
    }
}
