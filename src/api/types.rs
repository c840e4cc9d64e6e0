//! API request and response types

use crate::state_machine::{ConvState, Event, Reply};
use serde::{Deserialize, Serialize};

/// Request to deliver one event to a user's conversation
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub event: Event,
}

/// A button the client can press; pressing it sends `event`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub label: String,
    pub event: Event,
}

/// Rendered form of a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub text: String,
    pub buttons: Vec<Button>,
}

impl View {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }
}

/// Response for a delivered event
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: Reply,
    pub state: ConvState,
    pub view: View,
}

/// Response with the current conversation state
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub user_id: String,
    pub state: ConvState,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
