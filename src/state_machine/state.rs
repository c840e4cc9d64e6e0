//! Conversation state types

use serde::{Deserialize, Serialize};

/// Conversation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// No flow in progress
    #[default]
    Idle,

    /// Registration started, waiting for the chosen secret
    AwaitingRegisterSecret,

    /// Login started, waiting for the secret
    AwaitingLoginSecret,

    /// Waiting for the text of a new entry
    AwaitingNewEntryText,

    /// Delete menu shown, waiting for a selection (or the delete-all confirmation)
    AwaitingDeleteSelection,

    /// Waiting for confirmation before wiping the account
    AwaitingAccountDeleteConfirmation,

    /// Waiting for a search query. Re-entrant: stays here after each search.
    AwaitingSearchQuery,

    /// Edit menu shown, waiting for the entry to edit
    AwaitingEditSelection,

    /// Waiting for the replacement text of the remembered entry
    AwaitingEditText,
}

impl ConvState {
    pub fn is_idle(self) -> bool {
        matches!(self, ConvState::Idle)
    }

    /// States in which the edit scratch is allowed to live
    pub fn holds_scratch(self) -> bool {
        matches!(
            self,
            ConvState::AwaitingEditSelection | ConvState::AwaitingEditText
        )
    }
}

/// Short-lived per-conversation data.
///
/// Created empty on entering `AwaitingEditSelection` and cleared whenever
/// the conversation moves anywhere outside the edit flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scratch {
    /// Entry picked for editing, waiting for its new text
    pub edit_target: Option<String>,
}

impl Scratch {
    pub fn editing(entry_id: impl Into<String>) -> Self {
        Self {
            edit_target: Some(entry_id.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edit_target.is_none()
    }
}

/// Context for a conversation (immutable configuration)
#[derive(Debug, Clone)]
pub struct ConvContext {
    /// Remote user this conversation belongs to
    pub user_id: String,
}

impl ConvContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
