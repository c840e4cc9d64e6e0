//! Text rendering of replies
//!
//! The state machine only produces symbolic replies. This is the one place
//! they become user-facing strings and buttons.

use super::types::{Button, View};
use crate::state_machine::{Event, Menu, MenuKind, MenuOption, Outcome, Prompt, Rejection, Reply};

pub fn render(reply: &Reply) -> View {
    match reply {
        Reply::Prompt(prompt) => View::text(prompt_text(*prompt)),
        Reply::Done(outcome) => View::text(outcome_text(*outcome)),
        Reply::Rejected(rejection) => View::text(rejection_text(*rejection)),
        Reply::Entries(listed) => View::text(
            listed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n\n"),
        ),
        Reply::Empty => View::text("📭 You have no diary entries yet."),
        Reply::NoMatch => View::text("❌ No matching entries."),
        Reply::Menu(menu) => render_menu(menu),
    }
}

fn prompt_text(prompt: Prompt) -> &'static str {
    match prompt {
        Prompt::RegisterSecret => "Please choose a password:",
        Prompt::LoginSecret => "Please enter your password:",
        Prompt::EntryText => "Please send the text of your entry:",
        Prompt::SearchQuery => "🔍 Enter a search phrase (at least 3 characters):",
        Prompt::EditText => "Please send the new text of the entry:",
    }
}

fn outcome_text(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Registered => "✅ Registration complete.",
        Outcome::LoggedIn => "✅ Logged in!",
        Outcome::LoggedOut => "🚪 You have been logged out.",
        Outcome::EntrySaved => "✅ Entry saved.",
        Outcome::EntryDeleted => "✅ Entry deleted.",
        Outcome::AllEntriesDeleted => "✅ All entries deleted.",
        Outcome::EntryEdited => "✅ Entry updated.",
        Outcome::AccountDeleted => "✅ Account and entries deleted.",
        Outcome::Cancelled => "❌ Cancelled.",
    }
}

fn rejection_text(rejection: Rejection) -> &'static str {
    match rejection {
        Rejection::NotAuthenticated => "❌ Please log in first (/login).",
        Rejection::NotRegistered => "Please register first.",
        Rejection::AlreadyRegistered => "You are already registered.",
        Rejection::AlreadyAuthenticated => "You are already logged in.",
        Rejection::InvalidCredentials => "❌ Wrong password.",
        Rejection::QueryTooShort => "🔎 Enter at least 3 characters.",
        Rejection::NothingToActOn => "📭 There are no entries to choose from.",
        Rejection::MissingEditTarget => "❌ Could not edit the entry.",
    }
}

fn render_menu(menu: &Menu) -> View {
    let text = match menu.kind {
        MenuKind::Main => "Hello! Choose an option:",
        MenuKind::DeleteSelection => "Which entry do you want to delete?",
        MenuKind::EditSelection => "Which entry do you want to edit?",
        MenuKind::ConfirmDeleteAll => "Are you sure?",
        MenuKind::ConfirmDeleteAccount => "Are you sure you want to delete your account?",
    };

    let buttons = menu
        .options
        .iter()
        .map(|option| Button {
            label: option_label(menu.kind, option),
            event: option.event().clone(),
        })
        .collect();

    View {
        text: text.to_string(),
        buttons,
    }
}

fn option_label(kind: MenuKind, option: &MenuOption) -> String {
    match option {
        MenuOption::Command { event } => command_label(event).to_string(),
        MenuOption::Entry {
            position, preview, ..
        } => match kind {
            MenuKind::DeleteSelection => format!("Delete {position}. {preview}"),
            _ => format!("{position}. {preview}"),
        },
        MenuOption::DeleteAll { .. } => "Delete all entries".to_string(),
        MenuOption::Confirm { .. } => match kind {
            MenuKind::ConfirmDeleteAccount => "Confirm account deletion".to_string(),
            _ => "Confirm delete all".to_string(),
        },
        MenuOption::Cancel { .. } => "Cancel".to_string(),
    }
}

fn command_label(event: &Event) -> &'static str {
    match event {
        Event::Register => "📝 Register",
        Event::Login => "🔐 Log in",
        Event::Add => "➕ Add entry",
        Event::Show => "📚 Show entries",
        Event::Search => "🔍 Search entries",
        Event::Delete => "❌ Delete entry",
        Event::Edit => "✏️ Edit entry",
        Event::DeleteAccount => "❌ Delete account",
        Event::Logout => "🚪 Log out",
        other => other.kind(),
    }
}
