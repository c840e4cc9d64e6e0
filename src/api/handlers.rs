//! HTTP request handlers

use super::render::render;
use super::types::{ChatRequest, ChatResponse, ErrorResponse, StateResponse};
use super::AppState;
use crate::runtime::RuntimeError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Event delivery
        .route("/api/chat", post(send_chat))
        // Conversation inspection
        .route("/api/users/:user_id/state", get(get_state))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Conversation
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let user_id = validate_user_id(&req.user_id)?;
    tracing::debug!(user_id = %user_id, event = req.event.kind(), "Chat event");

    let dispatched = state.runtime.dispatch(user_id, req.event).await?;
    let view = render(&dispatched.reply);

    Ok(Json(ChatResponse {
        reply: dispatched.reply,
        state: dispatched.state,
        view,
    }))
}

async fn get_state(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<StateResponse>, AppError> {
    let user_id = validate_user_id(&user_id)?;
    let conv_state = state.runtime.state_of(user_id).await?;

    Ok(Json(StateResponse {
        user_id: user_id.to_string(),
        state: conv_state,
    }))
}

/// Identifiers are opaque: blank ones are refused, others pass through as sent
fn validate_user_id(user_id: &str) -> Result<&str, AppError> {
    if user_id.trim().is_empty() {
        return Err(AppError::BadRequest("user_id must not be blank".to_string()));
    }
    Ok(user_id)
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("diary-bot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::InvalidTransition(_) => AppError::BadRequest(err.to_string()),
            RuntimeError::StoreUnavailable(_) => AppError::ServiceUnavailable(err.to_string()),
            RuntimeError::Closed(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
