//! Store contracts used by the conversation runtime
//!
//! These traits let the executor run against `SQLite` in production and
//! an in-memory fake in tests.

use crate::db::{Database, DbError, Entry, User};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure of an underlying store call
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("record already exists: {0}")]
    Conflict(String),
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::UserExists(id) => StoreError::Conflict(id),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// One record per registered user
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    /// Only used by account deletion
    async fn delete(&self, user_id: &str) -> Result<(), StoreError>;
}

/// At most one session flag per user
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_active(&self, user_id: &str) -> Result<bool, StoreError>;

    /// Activate the session, replacing any existing record
    async fn upsert_active(&self, user_id: &str) -> Result<(), StoreError>;

    /// Remove the session. Absent records are not an error.
    async fn delete(&self, user_id: &str) -> Result<(), StoreError>;
}

/// Diary entries keyed by (owner, entry id)
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn insert(&self, entry: &Entry) -> Result<(), StoreError>;

    /// All entries for `owner` in store order
    async fn find_all(&self, owner: &str) -> Result<Vec<Entry>, StoreError>;

    async fn find_matching(
        &self,
        owner: &str,
        needle: &str,
        case_insensitive: bool,
    ) -> Result<Vec<Entry>, StoreError>;

    async fn delete_one(&self, owner: &str, entry_id: &str) -> Result<(), StoreError>;

    async fn delete_all(&self, owner: &str) -> Result<(), StoreError>;

    async fn update_text(&self, owner: &str, entry_id: &str, text: &str)
        -> Result<(), StoreError>;
}

/// Combined storage trait for convenience
pub trait Storage: CredentialStore + SessionStore + EntryStore {}
impl<T: CredentialStore + SessionStore + EntryStore> Storage for T {}

/// Shared handle passed to every conversation runtime
pub type SharedStorage = Arc<dyn Storage>;

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: CredentialStore + ?Sized> CredentialStore for Arc<T> {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        (**self).find_by_id(user_id).await
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        CredentialStore::insert(&**self, user).await
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        CredentialStore::delete(&**self, user_id).await
    }
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn find_active(&self, user_id: &str) -> Result<bool, StoreError> {
        (**self).find_active(user_id).await
    }

    async fn upsert_active(&self, user_id: &str) -> Result<(), StoreError> {
        (**self).upsert_active(user_id).await
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        SessionStore::delete(&**self, user_id).await
    }
}

#[async_trait]
impl<T: EntryStore + ?Sized> EntryStore for Arc<T> {
    async fn insert(&self, entry: &Entry) -> Result<(), StoreError> {
        EntryStore::insert(&**self, entry).await
    }

    async fn find_all(&self, owner: &str) -> Result<Vec<Entry>, StoreError> {
        (**self).find_all(owner).await
    }

    async fn find_matching(
        &self,
        owner: &str,
        needle: &str,
        case_insensitive: bool,
    ) -> Result<Vec<Entry>, StoreError> {
        (**self).find_matching(owner, needle, case_insensitive).await
    }

    async fn delete_one(&self, owner: &str, entry_id: &str) -> Result<(), StoreError> {
        (**self).delete_one(owner, entry_id).await
    }

    async fn delete_all(&self, owner: &str) -> Result<(), StoreError> {
        (**self).delete_all(owner).await
    }

    async fn update_text(
        &self,
        owner: &str,
        entry_id: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        (**self).update_text(owner, entry_id, text).await
    }
}

// ============================================================================
// Production Adapter
// ============================================================================

/// Adapter to use Database as Storage
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for DatabaseStorage {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.db.get_user(user_id)?)
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        Ok(self.db.create_user(user)?)
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        Ok(self.db.delete_user(user_id)?)
    }
}

#[async_trait]
impl SessionStore for DatabaseStorage {
    async fn find_active(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.db.is_logged_in(user_id)?)
    }

    async fn upsert_active(&self, user_id: &str) -> Result<(), StoreError> {
        Ok(self.db.set_logged_in(user_id)?)
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        Ok(self.db.delete_session(user_id)?)
    }
}

#[async_trait]
impl EntryStore for DatabaseStorage {
    async fn insert(&self, entry: &Entry) -> Result<(), StoreError> {
        Ok(self.db.add_diary(entry)?)
    }

    async fn find_all(&self, owner: &str) -> Result<Vec<Entry>, StoreError> {
        Ok(self.db.list_diaries(owner)?)
    }

    async fn find_matching(
        &self,
        owner: &str,
        needle: &str,
        case_insensitive: bool,
    ) -> Result<Vec<Entry>, StoreError> {
        Ok(self.db.search_diaries(owner, needle, case_insensitive)?)
    }

    async fn delete_one(&self, owner: &str, entry_id: &str) -> Result<(), StoreError> {
        if !self.db.delete_diary(owner, entry_id)? {
            tracing::warn!(user_id = %owner, entry_id = %entry_id, "Delete matched no entry");
        }
        Ok(())
    }

    async fn delete_all(&self, owner: &str) -> Result<(), StoreError> {
        let removed = self.db.delete_all_diaries(owner)?;
        tracing::debug!(user_id = %owner, removed, "Deleted all entries");
        Ok(())
    }

    async fn update_text(
        &self,
        owner: &str,
        entry_id: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        if !self.db.update_diary_text(owner, entry_id, text)? {
            tracing::warn!(user_id = %owner, entry_id = %entry_id, "Edit matched no entry");
        }
        Ok(())
    }
}
