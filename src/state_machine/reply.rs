//! Structured results handed to the presentation layer
//!
//! The core never formats visual layout. It only decides what kind of
//! answer to give and with which data; `api::render` turns that into text
//! and buttons.

use super::Event;
use crate::db::Entry;
use serde::Serialize;
use std::fmt;

/// Characters of entry text shown in delete/edit menus
pub const PREVIEW_CHARS: usize = 20;

/// Result of handling one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Reply {
    /// Ask the user to type something
    Prompt(Prompt),
    /// An action completed
    Done(Outcome),
    /// A guard or validation failed
    Rejected(Rejection),
    /// Enumerated entries (show or search results)
    Entries(Vec<ListedEntry>),
    /// `show` with no entries
    Empty,
    /// Search found nothing
    NoMatch,
    /// Selectable options
    Menu(Menu),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
    RegisterSecret,
    LoginSecret,
    EntryText,
    SearchQuery,
    EditText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Registered,
    LoggedIn,
    LoggedOut,
    EntrySaved,
    EntryDeleted,
    AllEntriesDeleted,
    EntryEdited,
    AccountDeleted,
    Cancelled,
}

/// Guard and validation failures. Handled locally, never escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    NotAuthenticated,
    NotRegistered,
    AlreadyRegistered,
    AlreadyAuthenticated,
    /// Recoverable: the login prompt repeats
    InvalidCredentials,
    /// Recoverable: the search prompt repeats
    QueryTooShort,
    NothingToActOn,
    MissingEditTarget,
}

/// One line of a `show` or search listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedEntry {
    /// 1-indexed position in store order
    pub position: usize,
    pub text: String,
}

impl ListedEntry {
    pub fn enumerate(entries: &[Entry]) -> Vec<Self> {
        entries
            .iter()
            .enumerate()
            .map(|(i, e)| ListedEntry {
                position: i + 1,
                text: e.text.clone(),
            })
            .collect()
    }
}

impl fmt::Display for ListedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.position, self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuKind {
    Main,
    DeleteSelection,
    ConfirmDeleteAll,
    EditSelection,
    ConfirmDeleteAccount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Menu {
    pub kind: MenuKind,
    pub options: Vec<MenuOption>,
}

/// A selectable option and the event it sends back
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "option", rename_all = "snake_case")]
pub enum MenuOption {
    /// Main menu command
    Command { event: Event },
    /// One entry, shown by position and a short preview
    Entry {
        position: usize,
        preview: String,
        event: Event,
    },
    DeleteAll { event: Event },
    Confirm { event: Event },
    Cancel { event: Event },
}

impl MenuOption {
    pub fn event(&self) -> &Event {
        match self {
            MenuOption::Command { event }
            | MenuOption::Entry { event, .. }
            | MenuOption::DeleteAll { event }
            | MenuOption::Confirm { event }
            | MenuOption::Cancel { event } => event,
        }
    }

    fn cancel() -> Self {
        MenuOption::Cancel {
            event: Event::Cancel,
        }
    }
}

impl Menu {
    /// The nine commands of the main menu
    pub fn main() -> Self {
        let options = [
            Event::Register,
            Event::Login,
            Event::Add,
            Event::Show,
            Event::Search,
            Event::Delete,
            Event::Edit,
            Event::DeleteAccount,
            Event::Logout,
        ]
        .into_iter()
        .map(|event| MenuOption::Command { event })
        .collect();
        Self {
            kind: MenuKind::Main,
            options,
        }
    }

    /// One option per entry followed by "delete all"
    pub fn delete_selection(entries: &[Entry]) -> Self {
        let mut options = entry_options(entries, |id| Event::SelectEntry { entry_id: id });
        options.push(MenuOption::DeleteAll {
            event: Event::SelectDeleteAll,
        });
        Self {
            kind: MenuKind::DeleteSelection,
            options,
        }
    }

    pub fn edit_selection(entries: &[Entry]) -> Self {
        Self {
            kind: MenuKind::EditSelection,
            options: entry_options(entries, |id| Event::SelectEdit { entry_id: id }),
        }
    }

    pub fn confirm_delete_all() -> Self {
        Self {
            kind: MenuKind::ConfirmDeleteAll,
            options: vec![
                MenuOption::Confirm {
                    event: Event::ConfirmDeleteAll,
                },
                MenuOption::cancel(),
            ],
        }
    }

    pub fn confirm_delete_account() -> Self {
        Self {
            kind: MenuKind::ConfirmDeleteAccount,
            options: vec![
                MenuOption::Confirm {
                    event: Event::ConfirmDeleteAccount,
                },
                MenuOption::cancel(),
            ],
        }
    }
}

fn entry_options(entries: &[Entry], select: impl Fn(String) -> Event) -> Vec<MenuOption> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| MenuOption::Entry {
            position: i + 1,
            preview: preview(&e.text),
            event: select(e.diary_id.clone()),
        })
        .collect()
}

/// First `PREVIEW_CHARS` characters of `text`, with `...` if cut
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
