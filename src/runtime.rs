//! Runtime for executing conversations
//!
//! Each user gets one `ConversationRuntime` task fed through an mpsc
//! channel, so events for the same user are handled strictly one at a
//! time while different users proceed independently.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationRuntime;
pub use traits::*;

use crate::state_machine::{ConvContext, ConvState, Event, Reply, TransitionError};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, RwLock};

/// Pending requests per conversation before senders wait
const REQUEST_BUFFER: usize = 32;

/// Successful handling of one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatched {
    pub reply: Reply,
    /// State after the event
    pub state: ConvState,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("Conversation runtime for {0} is not running")]
    Closed(String),
}

/// Messages accepted by a conversation runtime
#[derive(Debug)]
pub enum Request {
    Dispatch {
        event: Event,
        respond_to: oneshot::Sender<Response>,
    },
    State {
        respond_to: oneshot::Sender<ConvState>,
    },
}

/// Answer to a dispatched event
#[derive(Debug)]
pub enum Response {
    Handled(Result<Dispatched, RuntimeError>),
    /// The runtime retired before reaching the event, which was not processed
    Retired(Event),
}

/// Handle to interact with a running conversation
pub struct ConversationHandle {
    pub request_tx: mpsc::Sender<Request>,
}

/// Manager for all conversation runtimes
///
/// A runtime lives only while its conversation holds something: once it is
/// back in `Idle` with empty scratch it retires and its handle is dropped.
/// The next event for that user starts a fresh runtime.
pub struct RuntimeManager {
    storage: SharedStorage,
    runtimes: RwLock<HashMap<String, ConversationHandle>>,
}

impl RuntimeManager {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            storage,
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    /// Get the request channel for a user, spawning its runtime if none is live
    async fn get_or_create(&self, user_id: &str) -> mpsc::Sender<Request> {
        if let Some(handle) = self.runtimes.read().await.get(user_id) {
            if !handle.request_tx.is_closed() {
                return handle.request_tx.clone();
            }
        }

        let mut runtimes = self.runtimes.write().await;
        // Another request may have created it while we waited for the lock
        if let Some(handle) = runtimes.get(user_id) {
            if !handle.request_tx.is_closed() {
                return handle.request_tx.clone();
            }
        }

        let (request_tx, request_rx) = mpsc::channel(REQUEST_BUFFER);
        let runtime = ConversationRuntime::new(
            ConvContext::new(user_id),
            self.storage.clone(),
            request_rx,
        );
        tokio::spawn(runtime.run());
        tracing::debug!(user_id = %user_id, "Started conversation");

        runtimes.insert(
            user_id.to_string(),
            ConversationHandle {
                request_tx: request_tx.clone(),
            },
        );
        request_tx
    }

    /// Drop the handle of a retired runtime
    async fn reap(&self, user_id: &str) {
        let mut runtimes = self.runtimes.write().await;
        // A newer runtime may already have replaced the retired one
        if runtimes
            .get(user_id)
            .is_some_and(|handle| handle.request_tx.is_closed())
        {
            runtimes.remove(user_id);
            tracing::debug!(user_id = %user_id, "Conversation retired");
        }
    }

    /// Handle one event for a user and wait for the result
    pub async fn dispatch(
        &self,
        user_id: &str,
        mut event: Event,
    ) -> Result<Dispatched, RuntimeError> {
        loop {
            let request_tx = self.get_or_create(user_id).await;
            let (respond_to, response) = oneshot::channel();

            if let Err(mpsc::error::SendError(request)) = request_tx
                .send(Request::Dispatch { event, respond_to })
                .await
            {
                // Retired between lookup and send; retry on a fresh runtime
                let Request::Dispatch { event: returned, .. } = request else {
                    return Err(RuntimeError::Closed(user_id.to_string()));
                };
                event = returned;
                continue;
            }

            match response.await {
                Ok(Response::Handled(result)) => {
                    if request_tx.is_closed() {
                        self.reap(user_id).await;
                    }
                    return result;
                }
                Ok(Response::Retired(returned)) => event = returned,
                Err(_) => return Err(RuntimeError::Closed(user_id.to_string())),
            }
        }
    }

    /// Current state of a user's conversation. `Idle` if none is running.
    pub async fn state_of(&self, user_id: &str) -> Result<ConvState, RuntimeError> {
        let request_tx = match self.runtimes.read().await.get(user_id) {
            Some(handle) => handle.request_tx.clone(),
            None => return Ok(ConvState::Idle),
        };
        let (respond_to, response) = oneshot::channel();

        // Runtimes only retire at rest
        if request_tx.send(Request::State { respond_to }).await.is_err() {
            return Ok(ConvState::Idle);
        }

        response
            .await
            .map_err(|_| RuntimeError::Closed(user_id.to_string()))
    }
}
