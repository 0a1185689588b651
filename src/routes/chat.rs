//! Chat route — protocol translation around the Request Router.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

use crate::protocol::{ChatRequest, ChatResponse};
use crate::services::dispatch::{self, ChatOutcome, DispatchError};
use crate::state::AppState;

type ErrorBody = (StatusCode, Json<serde_json::Value>);

/// `POST /api/chat` — route a message to the matching AI operation.
pub async fn chat(State(state): State<AppState>, Json(body): Json<ChatRequest>) -> Result<Json<ChatResponse>, ErrorBody> {
    match dispatch::dispatch(&state, &body).await {
        Ok(outcome) => Ok(Json(to_wire(outcome))),
        Err(e) => {
            let status = dispatch_error_to_status(&e);
            let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                tracing::error!(error = %e, "chat: dispatch failed");
                "Internal server error".to_owned()
            } else {
                e.to_string()
            };
            Err((status, Json(serde_json::json!({ "error": message }))))
        }
    }
}

/// Encode an outcome onto the wire. Degraded replies keep the 200 status
/// and carry their reason in the `error` field.
pub(crate) fn to_wire(outcome: ChatOutcome) -> ChatResponse {
    match outcome {
        ChatOutcome::Reply(reply) => {
            ChatResponse { kind: reply.kind, content: reply.content, file_url: reply.file_url, error: None }
        }
        ChatOutcome::Degraded { reason, reply } => ChatResponse {
            kind: reply.kind,
            content: reply.content,
            file_url: reply.file_url,
            error: Some(reason.as_str().to_owned()),
        },
    }
}

pub(crate) fn dispatch_error_to_status(err: &DispatchError) -> StatusCode {
    match err {
        DispatchError::EmptyContent
        | DispatchError::InvalidInputKind(_)
        | DispatchError::InvalidResponseFormat(_)
        | DispatchError::MissingFileUrl(_) => StatusCode::BAD_REQUEST,
        DispatchError::NotConfigured
        | DispatchError::Upstream(_)
        | DispatchError::Storage(_)
        | DispatchError::FileFetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
