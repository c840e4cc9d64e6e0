//! Database schema and record types

use crate::auth::SecretHash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    secret_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    user_id TEXT PRIMARY KEY,
    logged_in BOOLEAN NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS diaries (
    diary_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    text TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_diaries_user ON diaries(user_id);
";

/// Registered account. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub secret_hash: SecretHash,
}

/// A single diary entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub diary_id: String,
    pub user_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Create an entry with a freshly generated id
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            diary_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}
