//! Database module for the diary bot
//!
//! Persists accounts, login sessions and diary entries in `SQLite`.

mod schema;

pub use schema::*;

use crate::auth::SecretHash;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("User already exists: {0}")]
    UserExists(String),
    #[error("Database connection lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== User Operations ====================

    /// Get a user by id
    pub fn get_user(&self, user_id: &str) -> DbResult<Option<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT user_id, secret_hash FROM users WHERE user_id = ?1")?;

        let result = stmt.query_row(params![user_id], |row| {
            Ok(User {
                user_id: row.get(0)?,
                secret_hash: SecretHash::from_stored(row.get::<_, String>(1)?),
            })
        });

        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DbError::Sqlite(e)),
        }
    }

    /// Create a user. Fails with `UserExists` if the id is taken.
    pub fn create_user(&self, user: &User) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (user_id, secret_hash) VALUES (?1, ?2)",
            params![user.user_id, user.secret_hash.as_str()],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
                DbError::UserExists(user.user_id.clone())
            }
            other => DbError::Sqlite(other),
        })?;
        Ok(())
    }

    /// Delete a user record
    pub fn delete_user(&self, user_id: &str) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM users WHERE user_id = ?1", params![user_id])?;
        Ok(())
    }

    // ==================== Session Operations ====================

    /// Whether the user has an active session
    pub fn is_logged_in(&self, user_id: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let logged_in: Option<bool> = conn
            .query_row(
                "SELECT logged_in FROM sessions WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(logged_in.unwrap_or(false))
    }

    /// Mark the user's session active, replacing any previous record
    pub fn set_logged_in(&self, user_id: &str) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sessions (user_id, logged_in) VALUES (?1, 1)
             ON CONFLICT(user_id) DO UPDATE SET logged_in = 1",
            params![user_id],
        )?;
        Ok(())
    }

    /// Remove the session record. No-op if absent.
    pub fn delete_session(&self, user_id: &str) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id])?;
        Ok(())
    }

    // ==================== Diary Operations ====================

    /// Add a diary entry
    pub fn add_diary(&self, entry: &Entry) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO diaries (diary_id, user_id, text, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.diary_id,
                entry.user_id,
                entry.text,
                entry.created_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// All entries for a user, in insertion order
    pub fn list_diaries(&self, user_id: &str) -> DbResult<Vec<Entry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT diary_id, user_id, text, created_at FROM diaries
             WHERE user_id = ?1
             ORDER BY rowid ASC",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Entry {
                diary_id: row.get(0)?,
                user_id: row.get(1)?,
                text: row.get(2)?,
                created_at: parse_datetime(&row.get::<_, String>(3)?),
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Entries whose text contains `needle`, in insertion order.
    ///
    /// `SQLite`'s `LIKE` and `lower()` only fold ASCII, so matching happens
    /// here with full Unicode case folding.
    pub fn search_diaries(
        &self,
        user_id: &str,
        needle: &str,
        case_insensitive: bool,
    ) -> DbResult<Vec<Entry>> {
        let entries = self.list_diaries(user_id)?;
        if case_insensitive {
            let needle = needle.to_lowercase();
            Ok(entries
                .into_iter()
                .filter(|e| e.text.to_lowercase().contains(&needle))
                .collect())
        } else {
            Ok(entries
                .into_iter()
                .filter(|e| e.text.contains(needle))
                .collect())
        }
    }

    /// Delete one entry owned by the user. Returns whether a row was removed.
    pub fn delete_diary(&self, user_id: &str, diary_id: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM diaries WHERE user_id = ?1 AND diary_id = ?2",
            params![user_id, diary_id],
        )?;
        Ok(deleted > 0)
    }

    /// Delete every entry owned by the user. Returns the count removed.
    pub fn delete_all_diaries(&self, user_id: &str) -> DbResult<usize> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM diaries WHERE user_id = ?1", params![user_id])?;
        Ok(deleted)
    }

    /// Replace the text of one entry. Returns whether a row was updated.
    pub fn update_diary_text(&self, user_id: &str, diary_id: &str, text: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE diaries SET text = ?1 WHERE user_id = ?2 AND diary_id = ?3",
            params![text, user_id, diary_id],
        )?;
        Ok(updated > 0)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
