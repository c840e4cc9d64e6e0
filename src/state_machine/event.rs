//! Events that can occur in a conversation

use serde::{Deserialize, Serialize};

/// User actions, decoded once at the presentation boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    // Menu commands
    Start,
    Register,
    Login,
    Add,
    Show,
    Search,
    Delete,
    DeleteAccount,
    Logout,
    Edit,

    // Selections from rendered menus
    SelectEntry { entry_id: String },
    SelectDeleteAll,
    ConfirmDeleteAll,
    ConfirmDeleteAccount,
    Cancel,
    SelectEdit { entry_id: String },

    /// Free text typed by the user
    Text { text: String },
}

impl Event {
    /// Menu commands start a new flow from any state
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Event::Start
                | Event::Register
                | Event::Login
                | Event::Add
                | Event::Show
                | Event::Search
                | Event::Delete
                | Event::DeleteAccount
                | Event::Logout
                | Event::Edit
        )
    }

    /// Commands that only a logged-in user may run
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Event::Add
                | Event::Show
                | Event::Search
                | Event::Delete
                | Event::DeleteAccount
                | Event::Edit
        )
    }

    /// Stable name for logs and errors. Never includes user text.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::Register => "register",
            Event::Login => "login",
            Event::Add => "add",
            Event::Show => "show",
            Event::Search => "search",
            Event::Delete => "delete",
            Event::DeleteAccount => "delete_account",
            Event::Logout => "logout",
            Event::Edit => "edit",
            Event::SelectEntry { .. } => "select_entry",
            Event::SelectDeleteAll => "select_delete_all",
            Event::ConfirmDeleteAll => "confirm_delete_all",
            Event::ConfirmDeleteAccount => "confirm_delete_account",
            Event::Cancel => "cancel",
            Event::SelectEdit { .. } => "select_edit",
            Event::Text { .. } => "text",
        }
    }

    #[cfg(test)]
    pub fn text(text: impl Into<String>) -> Self {
        Event::Text { text: text.into() }
    }
}
