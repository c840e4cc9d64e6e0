//! Effects produced by state transitions

use crate::db::User;

/// Store writes to be executed after a transition, in order.
///
/// All effects act on the conversation's own user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Create the account record
    CreateUser { user: User },

    /// Activate (upsert) the session
    ActivateSession,

    /// Drop the session record
    DeleteSession,

    /// Store a new entry under a freshly generated id
    InsertEntry { text: String },

    DeleteEntry { entry_id: String },

    DeleteAllEntries,

    /// Replace the full text of one entry
    UpdateEntryText { entry_id: String, text: String },

    /// Remove entries, session and account, in that order
    DeleteAccount,
}

impl Effect {
    pub fn insert_entry(text: impl Into<String>) -> Self {
        Effect::InsertEntry { text: text.into() }
    }

    /// Name for logs. Never includes user text.
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::CreateUser { .. } => "create_user",
            Effect::ActivateSession => "activate_session",
            Effect::DeleteSession => "delete_session",
            Effect::InsertEntry { .. } => "insert_entry",
            Effect::DeleteEntry { .. } => "delete_entry",
            Effect::DeleteAllEntries => "delete_all_entries",
            Effect::UpdateEntryText { .. } => "update_entry_text",
            Effect::DeleteAccount => "delete_account",
        }
    }
}
