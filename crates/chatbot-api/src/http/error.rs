//! Application error type mapping to HTTP responses.
//!
//! JSON errors use the body `{"error": "<message>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::json;

use chatbot_types::error::{AuthError, ChatError};

/// Text of the 400 returned when the chat body has no usable message.
pub const NO_MESSAGE: &str = "No message provided.";

#[derive(Debug)]
pub enum AppError {
    /// 400 with the message as the error text.
    BadRequest(String),
    /// No valid session: redirect to the login page, remembering `next`.
    LoginRequired { next: String },
    /// 500; rendered as `Internal Server Error: <detail>`.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::EmptyMessage => AppError::BadRequest(NO_MESSAGE.to_string()),
            ChatError::Repository(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<minijinja::Error> for AppError {
    fn from(e: minijinja::Error) -> Self {
        AppError::Internal(format!("template error: {e}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            AppError::LoginRequired { next } => {
                Redirect::to(&format!("/login?next={}", encode_query_value(&next))).into_response()
            }
            AppError::Internal(detail) => {
                tracing::error!("internal error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": format!("Internal Server Error: {detail}") })),
                )
                    .into_response()
            }
        }
    }
}

/// Percent-encode everything except unreserved characters and `/`.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
