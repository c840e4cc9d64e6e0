//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! Store reads are gathered into [`Facts`] before a transition runs; store
//! writes come back out as [`Effect`]s for the runtime to execute.

mod effect;
pub mod event;
mod facts;
pub mod reply;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use facts::{Facts, Needs};
pub use reply::{ListedEntry, Menu, MenuKind, MenuOption, Outcome, Prompt, Rejection, Reply};
pub use state::{ConvContext, ConvState, Scratch};
pub use transition::{transition, TransitionError, TransitionResult};
