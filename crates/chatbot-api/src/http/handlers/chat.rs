//! Chat page and chat endpoint.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Html;
use minijinja::context;
use serde_json::{Value, json};

use crate::http::error::{AppError, NO_MESSAGE};
use crate::http::extractors::auth::CurrentUser;
use crate::state::AppState;

/// GET /chat
pub async fn chat_page(
    current: CurrentUser,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    state.templates.render(
        "chat.html",
        context! { username => current.user.username },
    )
}

/// POST /chat
///
/// Body `{"message": "..."}` -> `{"response": "..."}`. The body is read raw
/// so that malformed JSON surfaces as a 500 carrying the parser's message.
pub async fn send_message(
    current: CurrentUser,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let payload: Value =
        serde_json::from_slice(&body).map_err(|e| AppError::Internal(e.to_string()))?;
    let Value::Object(fields) = payload else {
        return Err(AppError::Internal(
            "request body must be a JSON object".to_string(),
        ));
    };

    let Some(message) = fields
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
    else {
        return Err(AppError::BadRequest(NO_MESSAGE.to_string()));
    };

    let reply = state
        .chat_service
        .send_message(
            &current.user.id,
            &current.session.conversation_key(),
            message,
        )
        .await?;

    Ok(Json(json!({ "response": reply.text })))
}
