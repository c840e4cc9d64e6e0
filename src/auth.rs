//! Credential hashing and the session gate
//!
//! Secrets are never stored or logged in the clear. The digest is
//! SHA-256 over a per-user salt followed by the secret, so two users
//! picking the same secret end up with different hashes while login
//! stays a plain equality check.

use crate::runtime::{SessionStore, StoreError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Separates the salt from the secret so that `("ab", "c")` and
/// `("a", "bc")` never hash the same input.
const SALT_SEPARATOR: u8 = 0x1f;

/// Hex-encoded SHA-256 digest of a salted secret
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretHash(String);

impl SecretHash {
    /// Wrap a digest loaded from storage
    pub fn from_stored(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep digests out of logs and panic messages.
impl fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretHash(..)")
    }
}

/// Hash `secret` for `user_id`. Deterministic.
pub fn hash_secret(user_id: &str, secret: &str) -> SecretHash {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update([SALT_SEPARATOR]);
    hasher.update(secret.as_bytes());
    SecretHash(format!("{:x}", hasher.finalize()))
}

/// Check a login attempt against the stored hash
pub fn verify_secret(user_id: &str, secret: &str, stored: &SecretHash) -> bool {
    hash_secret(user_id, secret) == *stored
}

/// Answers whether a user currently has an active session.
///
/// Guards every capability that requires authentication.
pub struct SessionGate<'a, S: SessionStore + ?Sized> {
    sessions: &'a S,
}

impl<'a, S: SessionStore + ?Sized> SessionGate<'a, S> {
    pub fn new(sessions: &'a S) -> Self {
        Self { sessions }
    }

    pub async fn is_active(&self, user_id: &str) -> Result<bool, StoreError> {
        self.sessions.find_active(user_id).await
    }
}
