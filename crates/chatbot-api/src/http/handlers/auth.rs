//! Signup, login and logout pages.

use std::collections::BTreeMap;

use axum::Form;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::{Html, IntoResponse, Redirect, Response};
use minijinja::context;
use serde::Deserialize;

use chatbot_types::error::AuthError;
use chatbot_types::user::{LoginForm, SignupForm};

use crate::http::cookies::{clear_cookie, read_cookie, session_cookie};
use crate::http::error::AppError;
use crate::state::AppState;

pub const MSG_INVALID_LOGIN: &str = "Invalid username or password.";
pub const MSG_INACTIVE: &str = "This account is inactive.";

/// GET /signup
pub async fn signup_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    render_signup(&state, "", &BTreeMap::new())
}

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    match state.auth_service.signup(&form).await {
        Ok(_) => Ok(Redirect::to("/login").into_response()),
        Err(AuthError::Validation(errors)) => {
            tracing::debug!(%errors, "signup rejected");
            Ok(render_signup(&state, form.username.trim(), errors.fields())?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

fn render_signup(
    state: &AppState,
    username: &str,
    errors: &BTreeMap<String, Vec<String>>,
) -> Result<Html<String>, AppError> {
    state.templates.render(
        "signup.html",
        context! { form_username => username, errors => errors },
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub next: Option<String>,
}

/// Login form plus the page to return to.
#[derive(Debug, Deserialize)]
pub struct LoginSubmission {
    #[serde(flatten)]
    pub credentials: LoginForm,
    #[serde(default)]
    pub next: Option<String>,
}

/// GET /login
pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Result<Html<String>, AppError> {
    state
        .templates
        .render("login.html", context! { next => safe_next(query.next.as_deref()) })
}

/// POST /login
///
/// Success sets the session cookie and redirects to `next` (local paths
/// only) or the chat page.
pub async fn login(
    State(state): State<AppState>,
    Form(submission): Form<LoginSubmission>,
) -> Result<Response, AppError> {
    let form = &submission.credentials;
    let next = safe_next(submission.next.as_deref());

    match state.auth_service.login(&form.username, &form.password).await {
        Ok(outcome) => {
            let session = &state.config.session;
            let cookie = session_cookie(
                &session.cookie_name,
                &outcome.token,
                session.ttl_hours * 3600,
            );
            Ok(([(SET_COOKIE, cookie)], Redirect::to(next)).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            render_login_error(&state, form, next, MSG_INVALID_LOGIN)
        }
        Err(AuthError::Inactive) => render_login_error(&state, form, next, MSG_INACTIVE),
        Err(e) => Err(e.into()),
    }
}

fn render_login_error(
    state: &AppState,
    form: &LoginForm,
    next: &str,
    error: &str,
) -> Result<Response, AppError> {
    let html = state.templates.render(
        "login.html",
        context! { form_username => form.username, next => next, error => error },
    )?;
    Ok(html.into_response())
}

/// Only same-site absolute paths are followed; anything else goes to `/chat`.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/chat",
    }
}

/// GET|POST /logout
///
/// Deletes the server-side session, forgets its conversation and clears the
/// cookie. Works (as a plain redirect) without a session too.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let cookie_name = &state.config.session.cookie_name;

    if let Some(token) = read_cookie(&headers, cookie_name) {
        if let Some(session) = state.auth_service.logout(&token).await? {
            state
                .chat_service
                .end_conversation(&session.conversation_key());
        }
    }

    Ok(([(SET_COOKIE, clear_cookie(cookie_name))], Redirect::to("/login")).into_response())
}
