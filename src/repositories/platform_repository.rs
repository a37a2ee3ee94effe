// src/repositories/platform_repository.rs
//
// Platform persistence

use std::sync::Arc;

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_timestamp, Repository};
use crate::db::ConnectionPool;
use crate::domain::{Platform, PlatformId};
use crate::error::{AppError, AppResult};

pub trait PlatformRepository: Repository<Platform> {
    fn list_all(&self) -> AppResult<Vec<Platform>>;
}

pub struct SqlitePlatformRepository {
    pool: Arc<ConnectionPool>,
}

impl SqlitePlatformRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_platform(row: &Row) -> rusqlite::Result<Platform> {
        let created_at: String = row.get(2)?;
        Ok(Platform {
            id: Some(PlatformId(row.get(0)?)),
            name: row.get(1)?,
            created_at: parse_timestamp(2, &created_at)?,
        })
    }
}

impl Repository<Platform> for SqlitePlatformRepository {
    fn find_by_natural_key(&self, name: &String) -> AppResult<Option<PlatformId>> {
        let conn = self.pool.get()?;

        let id = conn
            .query_row(
                "SELECT id FROM platforms WHERE name = ?1",
                params![name.trim()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(id.map(PlatformId))
    }

    fn insert(&self, platform: &Platform) -> AppResult<PlatformId> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO platforms (name, created_at) VALUES (?1, ?2)",
            params![platform.name, platform.created_at.to_rfc3339()],
        )
        .map_err(|e| AppError::from_insert(e, &format!("platform '{}'", platform.name)))?;

        Ok(PlatformId(conn.last_insert_rowid()))
    }

    fn get(&self, id: PlatformId) -> AppResult<Option<Platform>> {
        let conn = self.pool.get()?;

        let platform = conn
            .query_row(
                "SELECT id, name, created_at FROM platforms WHERE id = ?1",
                params![id.0],
                Self::row_to_platform,
            )
            .optional()?;

        Ok(platform)
    }
}

impl PlatformRepository for SqlitePlatformRepository {
    fn list_all(&self) -> AppResult<Vec<Platform>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id, name, created_at FROM platforms ORDER BY name")?;

        let platforms = stmt
            .query_map([], Self::row_to_platform)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(platforms)
    }
}
