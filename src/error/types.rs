// src/error/types.rs
//
// Error taxonomy shared by the store, the pipeline services and the adapters.
//
// RULES:
// - NotFound and AlreadyExists are expected outcomes, never batch-fatal
// - Transport covers every failure of a remote collaborator
// - Only store failures (Database / Pool) abort a batch

use rusqlite::ffi;
use serde::Serialize;
use thiserror::Error;

use crate::domain::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl AppError {
    /// True when the store itself is unusable and the batch must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Pool(_))
    }

    /// True for failures worth retrying after a short delay.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }

    /// Classify a failed INSERT.
    ///
    /// Constraint violations become the distinguishable outcomes callers
    /// rely on: uniqueness conflicts are `AlreadyExists`, a missing parent
    /// row is `NotFound`, and CHECK / NOT NULL failures are invariant
    /// violations. Anything else stays a database error.
    pub fn from_insert(err: rusqlite::Error, what: &str) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, ref message) = err {
            let detail = message.clone().unwrap_or_default();
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return AppError::AlreadyExists(format!("{} ({})", what, detail));
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return AppError::NotFound(format!("owner of {}", what));
                }
                ffi::SQLITE_CONSTRAINT_CHECK | ffi::SQLITE_CONSTRAINT_NOTNULL => {
                    return AppError::Domain(DomainError::InvariantViolation(format!(
                        "{} rejected by store: {}",
                        what, detail
                    )));
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::Other(format!("Date parse error: {}", err))
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Transport(format!("request timed out: {}", err))
        } else {
            AppError::Transport(err.to_string())
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn constraint_error(sql: &str) -> rusqlite::Error {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (
                 id INTEGER PRIMARY KEY,
                 name TEXT NOT NULL UNIQUE CHECK (length(name) > 0)
             );
             CREATE TABLE child (
                 id INTEGER PRIMARY KEY,
                 parent_id INTEGER NOT NULL REFERENCES parent(id)
             );
             INSERT INTO parent (id, name) VALUES (1, 'a');",
        )
        .unwrap();
        conn.execute(sql, []).unwrap_err()
    }

    #[test]
    fn test_unique_violation_is_already_exists() {
        let err = constraint_error("INSERT INTO parent (id, name) VALUES (2, 'a')");
        assert!(matches!(AppError::from_insert(err, "parent"), AppError::AlreadyExists(_)));
    }

    #[test]
    fn test_foreign_key_violation_is_not_found() {
        let err = constraint_error("INSERT INTO child (parent_id) VALUES (99)");
        assert!(matches!(AppError::from_insert(err, "child"), AppError::NotFound(_)));
    }

    #[test]
    fn test_check_violation_is_invariant() {
        let err = constraint_error("INSERT INTO parent (id, name) VALUES (3, '')");
        assert!(matches!(
            AppError::from_insert(err, "parent"),
            AppError::Domain(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_fatal_and_transient_classification() {
        assert!(AppError::Pool("gone".to_string()).is_fatal());
        assert!(!AppError::NotFound("x".to_string()).is_fatal());
        assert!(AppError::Transport("502".to_string()).is_transient());
        assert!(!AppError::AlreadyExists("x".to_string()).is_transient());
    }
}
