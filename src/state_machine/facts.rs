//! Store reads a transition depends on
//!
//! `transition` is pure, so every guard input is looked up beforehand.
//! [`Needs::for_event`] says exactly which lookups a (state, event) pair
//! requires; anything not listed is never read.

use super::{ConvState, Event};
use crate::db::{Entry, User};

/// Minimum length of a search query, in characters
pub const MIN_QUERY_CHARS: usize = 3;

/// Which store reads to perform before calling `transition`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Needs {
    /// Session gate answer
    pub session: bool,
    /// Credential record
    pub account: bool,
    /// All of the user's entries. Only loaded if the session is active.
    pub entries: bool,
    /// Trimmed search query to match against the user's entries
    pub search: Option<String>,
}

impl Needs {
    pub fn for_event(state: ConvState, event: &Event) -> Self {
        // Commands restart from Idle regardless of the current state
        if event.is_command() {
            return Self::for_command(event);
        }

        match (state, event) {
            (ConvState::AwaitingRegisterSecret | ConvState::AwaitingLoginSecret, Event::Text { .. }) => {
                Self {
                    account: true,
                    ..Self::default()
                }
            }
            (ConvState::AwaitingSearchQuery, Event::Text { text }) => {
                let query = text.trim();
                if query.chars().count() < MIN_QUERY_CHARS {
                    Self::default()
                } else {
                    Self {
                        search: Some(query.to_string()),
                        ..Self::default()
                    }
                }
            }
            _ => Self::default(),
        }
    }

    fn for_command(event: &Event) -> Self {
        match event {
            Event::Show | Event::Delete | Event::Edit => Self {
                session: true,
                entries: true,
                ..Self::default()
            },
            Event::Login | Event::Add | Event::Search | Event::DeleteAccount => Self {
                session: true,
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Results of the reads named by [`Needs`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facts {
    pub session_active: bool,
    pub account: Option<User>,
    pub entries: Vec<Entry>,
    pub matches: Vec<Entry>,
}

#[allow(dead_code)] // Builders used in tests
impl Facts {
    pub fn logged_in() -> Self {
        Self {
            session_active: true,
            ..Self::default()
        }
    }

    pub fn with_entries(mut self, entries: Vec<Entry>) -> Self {
        self.entries = entries;
        self
    }

    pub fn with_account(mut self, user: User) -> Self {
        self.account = Some(user);
        self
    }

    pub fn with_matches(mut self, matches: Vec<Entry>) -> Self {
        self.matches = matches;
        self
    }
}
