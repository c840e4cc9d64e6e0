//! Conversation runtime executor

use super::traits::{CredentialStore, EntryStore, SessionStore, Storage, StoreError};
use super::{Dispatched, Request, Response, RuntimeError};
use crate::auth::SessionGate;
use crate::db::Entry;
use crate::state_machine::{
    transition, ConvContext, ConvState, Effect, Event, Facts, Needs, Scratch,
};
use tokio::sync::mpsc;

/// Runs one user's conversation, one event at a time
pub struct ConversationRuntime<S>
where
    S: Storage + 'static,
{
    context: ConvContext,
    state: ConvState,
    scratch: Scratch,
    storage: S,
    request_rx: mpsc::Receiver<Request>,
}

impl<S> ConversationRuntime<S>
where
    S: Storage + 'static,
{
    pub fn new(context: ConvContext, storage: S, request_rx: mpsc::Receiver<Request>) -> Self {
        Self {
            context,
            state: ConvState::Idle,
            scratch: Scratch::default(),
            storage,
            request_rx,
        }
    }

    pub async fn run(mut self) {
        tracing::debug!(user_id = %self.context.user_id, "Starting conversation runtime");
        let mut retired = false;

        // Requests are handled strictly in arrival order
        while let Some(request) = self.request_rx.recv().await {
            match request {
                // Queued before retirement; the manager replays it on a new runtime
                Request::Dispatch { event, respond_to } if retired => {
                    let _ = respond_to.send(Response::Retired(event));
                }
                Request::Dispatch { event, respond_to } => {
                    let result = self.process_event(event).await;
                    if self.is_at_rest() {
                        // Close before answering so the caller sees the retirement
                        self.request_rx.close();
                        retired = true;
                    }
                    // Caller may have gone away; the state change still stands
                    let _ = respond_to.send(Response::Handled(result));
                }
                Request::State { respond_to } => {
                    let _ = respond_to.send(self.state);
                }
            }
        }

        tracing::debug!(user_id = %self.context.user_id, "Conversation runtime stopped");
    }

    /// Nothing left worth keeping a task for
    fn is_at_rest(&self) -> bool {
        self.state.is_idle() && self.scratch.is_empty()
    }

    /// Handle one event to completion
    pub async fn process_event(&mut self, event: Event) -> Result<Dispatched, RuntimeError> {
        let event_kind = event.kind();
        let needs = Needs::for_event(self.state, &event);

        let facts = match self.gather(&needs).await {
            Ok(facts) => facts,
            Err(e) => return Err(self.store_failure(event_kind, e)),
        };

        let result = transition(self.state, &self.scratch, &self.context, &facts, event)
            .inspect_err(|e| {
                tracing::debug!(user_id = %self.context.user_id, error = %e, "Rejected event");
            })?;

        for effect in &result.effects {
            if let Err(e) = self.execute_effect(effect).await {
                return Err(self.store_failure(event_kind, e));
            }
        }

        tracing::info!(
            user_id = %self.context.user_id,
            event = event_kind,
            from = ?self.state,
            to = ?result.new_state,
            "Transition"
        );

        self.state = result.new_state;
        self.scratch = result.scratch;
        debug_assert!(self.scratch.is_empty() || self.state.holds_scratch());

        Ok(Dispatched {
            reply: result.reply,
            state: self.state,
        })
    }

    #[allow(dead_code)] // Used in tests
    pub fn state(&self) -> ConvState {
        self.state
    }

    /// Store failures abort the flow; nothing is retried
    fn store_failure(&mut self, event_kind: &'static str, error: StoreError) -> RuntimeError {
        tracing::error!(
            user_id = %self.context.user_id,
            event = event_kind,
            error = %error,
            "Store call failed"
        );
        self.state = ConvState::Idle;
        self.scratch = Scratch::default();
        RuntimeError::StoreUnavailable(error)
    }

    /// Perform the reads named by `needs`
    async fn gather(&self, needs: &Needs) -> Result<Facts, StoreError> {
        let user_id = self.context.user_id.as_str();
        let mut facts = Facts::default();

        if needs.session {
            facts.session_active = SessionGate::new(&self.storage).is_active(user_id).await?;
        }
        if needs.account {
            facts.account = self.storage.find_by_id(user_id).await?;
        }
        // A closed gate rejects before entries matter
        if needs.entries && (facts.session_active || !needs.session) {
            facts.entries = self.storage.find_all(user_id).await?;
        }
        if let Some(query) = &needs.search {
            facts.matches = self.storage.find_matching(user_id, query, true).await?;
        }

        Ok(facts)
    }

    async fn execute_effect(&self, effect: &Effect) -> Result<(), StoreError> {
        let user_id = self.context.user_id.as_str();
        tracing::debug!(user_id = %user_id, effect = effect.kind(), "Executing effect");

        match effect {
            Effect::CreateUser { user } => CredentialStore::insert(&self.storage, user).await,
            Effect::ActivateSession => self.storage.upsert_active(user_id).await,
            Effect::DeleteSession => SessionStore::delete(&self.storage, user_id).await,
            Effect::InsertEntry { text } => {
                let entry = Entry::new(user_id, text.as_str());
                EntryStore::insert(&self.storage, &entry).await
            }
            Effect::DeleteEntry { entry_id } => self.storage.delete_one(user_id, entry_id).await,
            Effect::DeleteAllEntries => self.storage.delete_all(user_id).await,
            Effect::UpdateEntryText { entry_id, text } => {
                self.storage.update_text(user_id, entry_id, text).await
            }
            Effect::DeleteAccount => {
                // Not transactional: the first failure stops the sequence and is
                // reported. The user record goes last so a failed deletion still
                // leaves a usable account.
                self.storage.delete_all(user_id).await?;
                SessionStore::delete(&self.storage, user_id).await?;
                CredentialStore::delete(&self.storage, user_id).await
            }
        }
    }
}
