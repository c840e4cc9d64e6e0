//! Pure state transition function

use super::facts::MIN_QUERY_CHARS;
use super::reply::ListedEntry;
use super::{
    ConvContext, ConvState, Effect, Event, Facts, Menu, Outcome, Prompt, Rejection, Reply, Scratch,
};
use crate::auth::{hash_secret, verify_secret};
use crate::db::User;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: ConvState,
    /// Scratch to keep. Empty unless the new state is part of the edit flow.
    pub scratch: Scratch,
    /// Store writes, executed in order before the reply is delivered
    pub effects: Vec<Effect>,
    pub reply: Reply,
}

impl TransitionResult {
    pub fn new(state: ConvState, reply: Reply) -> Self {
        Self {
            new_state: state,
            scratch: Scratch::default(),
            effects: vec![],
            reply,
        }
    }

    /// Back to `Idle` with a reply and nothing else
    pub fn idle(reply: Reply) -> Self {
        Self::new(ConvState::Idle, reply)
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_scratch(mut self, scratch: Scratch) -> Self {
        self.scratch = scratch;
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Event '{event}' is not valid in state {state:?}")]
    InvalidTransition {
        state: ConvState,
        event: &'static str,
    },
}

/// Pure transition function
///
/// Given the same state, scratch, facts and event it always produces the
/// same result. Store access happens before (via `Facts`) and after (via
/// `Effect`s), never here.
#[allow(clippy::too_many_lines)]
pub fn transition(
    state: ConvState,
    scratch: &Scratch,
    context: &ConvContext,
    facts: &Facts,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Menu commands: valid everywhere, abandon any pending flow
        // ============================================================
        (_, event) if event.is_command() => Ok(command(facts, event)),

        // Cancel leaves any flow
        (state, Event::Cancel) if !state.is_idle() => {
            Ok(TransitionResult::idle(Reply::Done(Outcome::Cancelled)))
        }

        // ============================================================
        // Registration and login
        // ============================================================
        (ConvState::AwaitingRegisterSecret, Event::Text { text }) => {
            if facts.account.is_some() {
                return Ok(TransitionResult::idle(Reply::Rejected(
                    Rejection::AlreadyRegistered,
                )));
            }
            let user = User {
                user_id: context.user_id.clone(),
                secret_hash: hash_secret(&context.user_id, &text),
            };
            Ok(TransitionResult::idle(Reply::Done(Outcome::Registered))
                .with_effect(Effect::CreateUser { user }))
        }

        (ConvState::AwaitingLoginSecret, Event::Text { text }) => match &facts.account {
            None => Ok(TransitionResult::idle(Reply::Rejected(
                Rejection::NotRegistered,
            ))),
            Some(user) if verify_secret(&context.user_id, &text, &user.secret_hash) => {
                Ok(TransitionResult::idle(Reply::Done(Outcome::LoggedIn))
                    .with_effect(Effect::ActivateSession))
            }
            // Wrong secret: ask again
            Some(_) => Ok(TransitionResult::new(
                ConvState::AwaitingLoginSecret,
                Reply::Rejected(Rejection::InvalidCredentials),
            )),
        },

        // ============================================================
        // Add and search
        // ============================================================
        (ConvState::AwaitingNewEntryText, Event::Text { text }) => {
            Ok(TransitionResult::idle(Reply::Done(Outcome::EntrySaved))
                .with_effect(Effect::insert_entry(text)))
        }

        // Search stays put so the user can keep querying
        (ConvState::AwaitingSearchQuery, Event::Text { text }) => {
            let reply = if text.trim().chars().count() < MIN_QUERY_CHARS {
                Reply::Rejected(Rejection::QueryTooShort)
            } else if facts.matches.is_empty() {
                Reply::NoMatch
            } else {
                Reply::Entries(ListedEntry::enumerate(&facts.matches))
            };
            Ok(TransitionResult::new(ConvState::AwaitingSearchQuery, reply))
        }

        // ============================================================
        // Deletion
        // ============================================================
        (ConvState::AwaitingDeleteSelection, Event::SelectEntry { entry_id }) => {
            Ok(TransitionResult::idle(Reply::Done(Outcome::EntryDeleted))
                .with_effect(Effect::DeleteEntry { entry_id }))
        }

        (ConvState::AwaitingDeleteSelection, Event::SelectDeleteAll) => Ok(TransitionResult::new(
            ConvState::AwaitingDeleteSelection,
            Reply::Menu(Menu::confirm_delete_all()),
        )),

        (ConvState::AwaitingDeleteSelection, Event::ConfirmDeleteAll) => {
            Ok(TransitionResult::idle(Reply::Done(Outcome::AllEntriesDeleted))
                .with_effect(Effect::DeleteAllEntries))
        }

        (ConvState::AwaitingAccountDeleteConfirmation, Event::ConfirmDeleteAccount) => {
            Ok(TransitionResult::idle(Reply::Done(Outcome::AccountDeleted))
                .with_effect(Effect::DeleteAccount))
        }

        // ============================================================
        // Editing
        // ============================================================
        (ConvState::AwaitingEditSelection, Event::SelectEdit { entry_id }) => {
            Ok(
                TransitionResult::new(ConvState::AwaitingEditText, Reply::Prompt(Prompt::EditText))
                    .with_scratch(Scratch::editing(entry_id)),
            )
        }

        (ConvState::AwaitingEditText, Event::Text { text }) => match &scratch.edit_target {
            Some(entry_id) => Ok(TransitionResult::idle(Reply::Done(Outcome::EntryEdited))
                .with_effect(Effect::UpdateEntryText {
                    entry_id: entry_id.clone(),
                    text,
                })),
            None => Ok(TransitionResult::idle(Reply::Rejected(
                Rejection::MissingEditTarget,
            ))),
        },

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition {
            state,
            event: event.kind(),
        }),
    }
}

/// Handle a menu command as if from `Idle`
fn command(facts: &Facts, event: Event) -> TransitionResult {
    if event.requires_login() && !facts.session_active {
        return TransitionResult::idle(Reply::Rejected(Rejection::NotAuthenticated));
    }

    match event {
        Event::Register => TransitionResult::new(
            ConvState::AwaitingRegisterSecret,
            Reply::Prompt(Prompt::RegisterSecret),
        ),

        Event::Login if facts.session_active => {
            TransitionResult::idle(Reply::Rejected(Rejection::AlreadyAuthenticated))
        }
        Event::Login => TransitionResult::new(
            ConvState::AwaitingLoginSecret,
            Reply::Prompt(Prompt::LoginSecret),
        ),

        Event::Logout => TransitionResult::idle(Reply::Done(Outcome::LoggedOut))
            .with_effect(Effect::DeleteSession),

        Event::Add => TransitionResult::new(
            ConvState::AwaitingNewEntryText,
            Reply::Prompt(Prompt::EntryText),
        ),

        Event::Show if facts.entries.is_empty() => TransitionResult::idle(Reply::Empty),
        Event::Show => {
            TransitionResult::idle(Reply::Entries(ListedEntry::enumerate(&facts.entries)))
        }

        Event::Search => TransitionResult::new(
            ConvState::AwaitingSearchQuery,
            Reply::Prompt(Prompt::SearchQuery),
        ),

        Event::Delete | Event::Edit if facts.entries.is_empty() => {
            TransitionResult::idle(Reply::Rejected(Rejection::NothingToActOn))
        }
        Event::Delete => TransitionResult::new(
            ConvState::AwaitingDeleteSelection,
            Reply::Menu(Menu::delete_selection(&facts.entries)),
        ),
        // Scratch starts out empty on entering the edit flow
        Event::Edit => TransitionResult::new(
            ConvState::AwaitingEditSelection,
            Reply::Menu(Menu::edit_selection(&facts.entries)),
        ),

        Event::DeleteAccount => TransitionResult::new(
            ConvState::AwaitingAccountDeleteConfirmation,
            Reply::Menu(Menu::confirm_delete_account()),
        ),

        // Start, and anything else routed here, shows the main menu
        _ => TransitionResult::idle(Reply::Menu(Menu::main())),
    }
}
