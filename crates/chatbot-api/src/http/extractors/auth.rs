//! Session-cookie authentication extractor.
//!
//! Resolves the session cookie to a live session and active user. Requests
//! without one are redirected to the login page before the handler runs.
//! An expired session also drops its in-memory conversation.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use chatbot_core::auth::service::SessionLookup;

use chatbot_types::user::{AuthSession, User};

use crate::http::cookies::read_cookie;
use crate::http::error::AppError;
use crate::state::AppState;

/// The logged-in user behind the request.
pub struct CurrentUser {
    pub user: User,
    pub session: AuthSession,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let Some(token) = read_cookie(&parts.headers, &state.config.session.cookie_name) else {
            return Err(AppError::LoginRequired { next });
        };

        match state.auth_service.resolve(&token).await? {
            SessionLookup::Active { user, session } => {
                tracing::Span::current().record("user_id", tracing::field::display(user.id));
                Ok(CurrentUser { user, session })
            }
            SessionLookup::Expired(session) => {
                state.chat_service.end_conversation(&session.conversation_key());
                Err(AppError::LoginRequired { next })
            }
            SessionLookup::Invalid => Err(AppError::LoginRequired { next }),
        }
    }
}
