pub mod auth;
pub mod chat;

use axum::Json;
use axum::response::Redirect;
use serde_json::{Value, json};

/// GET / -- the chat page is the landing page.
pub async fn index() -> Redirect {
    Redirect::to("/chat")
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
