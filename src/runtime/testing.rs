//! In-memory store fake for testing
//!
//! Implements every store contract without I/O and can be told to fail
//! specific operations to exercise `StoreUnavailable` paths.

use super::traits::*;
use crate::db::{Entry, User};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    FindUser,
    InsertUser,
    DeleteUser,
    FindSession,
    UpsertSession,
    DeleteSession,
    InsertEntry,
    FindEntries,
    FindMatching,
    DeleteEntry,
    DeleteAllEntries,
    UpdateEntry,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    sessions: HashMap<String, bool>,
    /// Insertion order is store order
    entries: Vec<Entry>,
    failing: HashSet<Op>,
    calls: Vec<Op>,
}

/// Thread-safe in-memory implementation of all three stores
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    searches_in_flight: AtomicUsize,
    max_searches_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future call of `op` fail
    pub fn fail(&self, op: Op) {
        self.inner.lock().unwrap().failing.insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.inner.lock().unwrap().failing.remove(&op);
    }

    /// Every operation attempted so far, in order
    pub fn calls(&self) -> Vec<Op> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    /// Most `find_matching` calls ever observed running at once
    pub fn max_concurrent_searches(&self) -> usize {
        self.max_searches_in_flight.load(Ordering::SeqCst)
    }

    pub fn user(&self, user_id: &str) -> Option<User> {
        self.inner.lock().unwrap().users.get(user_id).cloned()
    }

    pub fn session(&self, user_id: &str) -> Option<bool> {
        self.inner.lock().unwrap().sessions.get(user_id).copied()
    }

    pub fn entries_of(&self, user_id: &str) -> Vec<Entry> {
        self.inner
            .lock()
            .unwrap()
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    fn with<T>(&self, op: Op, f: impl FnOnce(&mut Inner) -> T) -> Result<T, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(op);
        if inner.failing.contains(&op) {
            return Err(StoreError::Unavailable(format!("injected failure: {op:?}")));
        }
        Ok(f(&mut inner))
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        self.with(Op::FindUser, |s| s.users.get(user_id).cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        self.with(Op::InsertUser, |s| {
            if s.users.contains_key(&user.user_id) {
                return Err(StoreError::Conflict(user.user_id.clone()));
            }
            s.users.insert(user.user_id.clone(), user.clone());
            Ok(())
        })?
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        self.with(Op::DeleteUser, |s| {
            s.users.remove(user_id);
        })
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_active(&self, user_id: &str) -> Result<bool, StoreError> {
        self.with(Op::FindSession, |s| {
            s.sessions.get(user_id).copied().unwrap_or(false)
        })
    }

    async fn upsert_active(&self, user_id: &str) -> Result<(), StoreError> {
        self.with(Op::UpsertSession, |s| {
            s.sessions.insert(user_id.to_string(), true);
        })
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        self.with(Op::DeleteSession, |s| {
            s.sessions.remove(user_id);
        })
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn insert(&self, entry: &Entry) -> Result<(), StoreError> {
        self.with(Op::InsertEntry, |s| s.entries.push(entry.clone()))
    }

    async fn find_all(&self, owner: &str) -> Result<Vec<Entry>, StoreError> {
        self.with(Op::FindEntries, |s| {
            s.entries
                .iter()
                .filter(|e| e.user_id == owner)
                .cloned()
                .collect()
        })
    }

    async fn find_matching(
        &self,
        owner: &str,
        needle: &str,
        case_insensitive: bool,
    ) -> Result<Vec<Entry>, StoreError> {
        let running = self.searches_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_searches_in_flight.fetch_max(running, Ordering::SeqCst);
        // Stay in flight long enough for an unserialized caller to overlap
        tokio::time::sleep(Duration::from_millis(2)).await;

        let found = self.with(Op::FindMatching, |s| {
            let needle = if case_insensitive {
                needle.to_lowercase()
            } else {
                needle.to_string()
            };
            s.entries
                .iter()
                .filter(|e| e.user_id == owner)
                .filter(|e| {
                    if case_insensitive {
                        e.text.to_lowercase().contains(&needle)
                    } else {
                        e.text.contains(&needle)
                    }
                })
                .cloned()
                .collect()
        });
        self.searches_in_flight.fetch_sub(1, Ordering::SeqCst);
        found
    }

    async fn delete_one(&self, owner: &str, entry_id: &str) -> Result<(), StoreError> {
        self.with(Op::DeleteEntry, |s| {
            s.entries
                .retain(|e| !(e.user_id == owner && e.diary_id == entry_id));
        })
    }

    async fn delete_all(&self, owner: &str) -> Result<(), StoreError> {
        self.with(Op::DeleteAllEntries, |s| {
            s.entries.retain(|e| e.user_id != owner);
        })
    }

    async fn update_text(
        &self,
        owner: &str,
        entry_id: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        self.with(Op::UpdateEntry, |s| {
            if let Some(entry) = s
                .entries
                .iter_mut()
                .find(|e| e.user_id == owner && e.diary_id == entry_id)
            {
                entry.text = text.to_string();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_secret;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        let user = User {
            user_id: "alice".to_string(),
            secret_hash: hash_secret("alice", "pw1"),
        };
        CredentialStore::insert(&store, &user).await.unwrap();
        assert!(matches!(
            CredentialStore::insert(&store, &user).await,
            Err(StoreError::Conflict(_))
        ));

        EntryStore::insert(&store, &Entry::new("alice", "Hello")).await.unwrap();
        let hits = store.find_matching("alice", "hELLo", true).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(store.find_matching("alice", "hELLo", false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_searches_are_counted() {
        let store = MemoryStore::new();
        let (first, second) = tokio::join!(
            store.find_matching("alice", "abc", true),
            store.find_matching("alice", "abc", true)
        );
        first.unwrap();
        second.unwrap();
        assert_eq!(store.max_concurrent_searches(), 2);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.fail(Op::FindEntries);
        assert!(store.find_all("alice").await.is_err());
        store.recover(Op::FindEntries);
        assert!(store.find_all("alice").await.unwrap().is_empty());
        assert_eq!(store.calls(), vec![Op::FindEntries, Op::FindEntries]);
    }
}
