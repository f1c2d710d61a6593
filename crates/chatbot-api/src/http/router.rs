//! Axum router configuration with middleware.
//!
//! Pages: `/`, `/chat`, `/signup`, `/login`, `/logout`; plus `/health`.
//! Middleware: request tracing.

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/chat",
            get(handlers::chat::chat_page).post(handlers::chat::send_message),
        )
        .route(
            "/signup",
            get(handlers::auth::signup_page).post(handlers::auth::signup),
        )
        .route(
            "/login",
            get(handlers::auth::login_page).post(handlers::auth::login),
        )
        .route(
            "/logout",
            get(handlers::auth::logout).post(handlers::auth::logout),
        )
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::to_bytes;
    use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
    use axum::http::{Response, StatusCode};
    use chatbot_core::chat::service::APOLOGY_REPLY;
    use chatbot_core::llm::box_provider::BoxChatProvider;
    use chatbot_core::llm::provider::ChatProvider;
    use chatbot_core::repository::message::MessageRepository;
    use chatbot_core::repository::user::UserRepository;
    use chatbot_infra::sqlite::message::SqliteMessageRepository;
    use chatbot_infra::sqlite::pool::DatabasePool;
    use chatbot_types::config::AppConfig;
    use chatbot_types::llm::{ChatRequest, ChatResponse, LlmError, Usage};
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const PASSWORD: &str = "correct-horse-42";

    /// Echoes the last user turn with the history length; fails on "fail".
    #[derive(Clone, Default)]
    struct EchoProvider {
        calls: Arc<AtomicUsize>,
    }

    impl ChatProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let last = request.turns.last().map(|t| t.text.as_str()).unwrap_or("");
            if last == "fail" {
                return Err(LlmError::Provider {
                    message: "upstream exploded".to_string(),
                });
            }
            Ok(ChatResponse {
                text: format!("echo({}): {last}", request.turns.len()),
                model: request.model.clone(),
                finish_reason: Some("STOP".to_string()),
                usage: Usage::default(),
            })
        }
    }

    struct TestApp {
        router: Router,
        state: AppState,
        calls: Arc<AtomicUsize>,
        _dir: TempDir,
    }

    impl TestApp {
        async fn new(config: AppConfig) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let pool = DatabasePool::open_in(dir.path()).await.unwrap();
            let provider = EchoProvider::default();
            let calls = Arc::clone(&provider.calls);
            let state = AppState::from_parts(
                pool,
                config,
                BoxChatProvider::new(provider),
            )
            .unwrap();
            Self {
                router: build_router(state.clone()),
                state,
                calls,
                _dir: dir,
            }
        }

        async fn request(&self, request: Request<Body>) -> Response<Body> {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
            let mut builder = Request::builder().uri(uri);
            if let Some(cookie) = cookie {
                builder = builder.header(COOKIE, cookie);
            }
            self.request(builder.body(Body::empty()).unwrap()).await
        }

        async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
            let mut builder = Request::builder()
                .method("POST")
                .uri(uri)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
            if let Some(cookie) = cookie {
                builder = builder.header(COOKIE, cookie);
            }
            self.request(builder.body(Body::from(body.to_string())).unwrap())
                .await
        }

        async fn post_chat(&self, body: &str, cookie: Option<&str>) -> Response<Body> {
            let mut builder = Request::builder()
                .method("POST")
                .uri("/chat")
                .header(CONTENT_TYPE, "application/json");
            if let Some(cookie) = cookie {
                builder = builder.header(COOKIE, cookie);
            }
            self.request(builder.body(Body::from(body.to_string())).unwrap())
                .await
        }

        /// Create `username` and log in, returning the `name=value` cookie pair.
        async fn login_as(&self, username: &str) -> String {
            self.state
                .auth_service
                .create_user(username, PASSWORD)
                .await
                .unwrap();
            let response = self
                .post_form(
                    "/login",
                    &format!("username={username}&password={PASSWORD}"),
                    None,
                )
                .await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            cookie_pair(&response)
        }

        async fn user_count(&self) -> u64 {
            self.state.auth_service.users().count_users().await.unwrap()
        }
    }

    fn cookie_pair(response: &Response<Body>) -> String {
        let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    fn location(response: &Response<Body>) -> &str {
        response.headers()[LOCATION].to_str().unwrap()
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response<Body>) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    // --- Public routes ---

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new(AppConfig::default()).await;
        let response = app.get("/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_index_redirects_to_chat() {
        let app = TestApp::new(AppConfig::default()).await;
        let response = app.get("/", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/chat");
    }

    // --- Login required ---

    #[tokio::test]
    async fn test_unauthenticated_chat_page_redirects_to_login() {
        let app = TestApp::new(AppConfig::default()).await;
        let response = app.get("/chat", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login?next=/chat");
    }

    #[tokio::test]
    async fn test_unauthenticated_post_never_reaches_handler() {
        let app = TestApp::new(AppConfig::default()).await;
        let response = app.post_chat(r#"{"message": "hi"}"#, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("/login"));

        let response = app
            .post_chat(r#"{"message": "hi"}"#, Some("sessionid=forged"))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(app.calls.load(Ordering::SeqCst), 0);
    }

    // --- Signup ---

    #[tokio::test]
    async fn test_signup_page_renders() {
        let app = TestApp::new(AppConfig::default()).await;
        let response = app.get("/signup", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("name=\"password2\""));
    }

    #[tokio::test]
    async fn test_signup_valid_creates_one_user_and_redirects() {
        let app = TestApp::new(AppConfig::default()).await;
        let response = app
            .post_form(
                "/signup",
                &format!("username=alice&password1={PASSWORD}&password2={PASSWORD}"),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        assert_eq!(app.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_signup_invalid_rerenders_with_errors() {
        let app = TestApp::new(AppConfig::default()).await;
        let response = app
            .post_form(
                "/signup",
                "username=alice&password1=correct-horse-42&password2=different-horse-42",
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("didn\u{2019}t match"));
        assert!(html.contains("value=\"alice\""));
        assert_eq!(app.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_signup_duplicate_username() {
        let app = TestApp::new(AppConfig::default()).await;
        app.state
            .auth_service
            .create_user("alice", PASSWORD)
            .await
            .unwrap();

        let response = app
            .post_form(
                "/signup",
                &format!("username=alice&password1={PASSWORD}&password2={PASSWORD}"),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("A user with that username already exists."));
        assert_eq!(app.user_count().await, 1);
    }

    // --- Login / logout ---

    #[tokio::test]
    async fn test_login_sets_cookie_and_redirects() {
        let app = TestApp::new(AppConfig::default()).await;
        app.state
            .auth_service
            .create_user("alice", PASSWORD)
            .await
            .unwrap();

        let response = app
            .post_form("/login", &format!("username=alice&password={PASSWORD}"), None)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/chat");
        let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with("sessionid="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
    }

    #[tokio::test]
    async fn test_login_follows_local_next_only() {
        let app = TestApp::new(AppConfig::default()).await;
        app.state
            .auth_service
            .create_user("alice", PASSWORD)
            .await
            .unwrap();

        let response = app
            .post_form(
                "/login",
                &format!("username=alice&password={PASSWORD}&next=%2Fchat%3Fx%3D1"),
                None,
            )
            .await;
        assert_eq!(location(&response), "/chat?x=1");

        let response = app
            .post_form(
                "/login",
                &format!("username=alice&password={PASSWORD}&next=https%3A%2F%2Fevil.example"),
                None,
            )
            .await;
        assert_eq!(location(&response), "/chat");
    }

    #[tokio::test]
    async fn test_login_with_bad_password_rerenders() {
        let app = TestApp::new(AppConfig::default()).await;
        app.state
            .auth_service
            .create_user("alice", PASSWORD)
            .await
            .unwrap();

        let response = app
            .post_form("/login", "username=alice&password=nope", None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert!(body_text(response).await.contains("Invalid username or password."));
    }

    #[tokio::test]
    async fn test_logout_invalidates_session_server_side() {
        let app = TestApp::new(AppConfig::default()).await;
        let cookie = app.login_as("alice").await;

        assert_eq!(app.get("/chat", Some(&cookie)).await.status(), StatusCode::OK);

        let response = app.post_form("/logout", "", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        assert!(response.headers()[SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));

        // Replaying the old cookie no longer works.
        let response = app.get("/chat", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_logout_without_session_just_redirects() {
        let app = TestApp::new(AppConfig::default()).await;
        let response = app.get("/logout", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    // --- Chat ---

    #[tokio::test]
    async fn test_chat_page_renders_for_user() {
        let app = TestApp::new(AppConfig::default()).await;
        let cookie = app.login_as("alice").await;
        let response = app.get("/chat", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("alice"));
    }

    #[tokio::test]
    async fn test_chat_returns_response() {
        let app = TestApp::new(AppConfig::default()).await;
        let cookie = app.login_as("alice").await;

        for message in ["hello", " ", "ünïcødé ✓", "a much longer message with spaces"] {
            let body = json!({ "message": message }).to_string();
            let response = app.post_chat(&body, Some(&cookie)).await;
            assert_eq!(response.status(), StatusCode::OK);
            let body = body_json(response).await;
            assert!(body["response"].as_str().unwrap().ends_with(message));
        }
    }

    #[tokio::test]
    async fn test_chat_missing_or_empty_message_is_400() {
        let app = TestApp::new(AppConfig::default()).await;
        let cookie = app.login_as("alice").await;

        for body in [r#"{"message": ""}"#, r#"{}"#, r#"{"message": 42}"#, r#"{"text": "hi"}"#] {
            let response = app.post_chat(body, Some(&cookie)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(body_json(response).await, json!({"error": "No message provided."}));
        }
        assert_eq!(app.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_chat_malformed_json_is_500_with_detail() {
        let app = TestApp::new(AppConfig::default()).await;
        let cookie = app.login_as("alice").await;

        let response = app.post_chat("{not json", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error = body_json(response).await["error"].as_str().unwrap().to_string();
        let detail = error.strip_prefix("Internal Server Error: ").unwrap();
        assert!(detail.contains("line 1"), "{detail}");

        let response = app.post_chat("[1, 2]", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Internal Server Error: request body must be a JSON object"})
        );
    }

    #[tokio::test]
    async fn test_provider_failure_is_200_apology() {
        let app = TestApp::new(AppConfig::default()).await;
        let cookie = app.login_as("alice").await;

        let response = app.post_chat(r#"{"message": "fail"}"#, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"response": APOLOGY_REPLY}));

        // The failed turn left no trace in the history.
        let response = app.post_chat(r#"{"message": "next"}"#, Some(&cookie)).await;
        assert_eq!(body_json(response).await["response"], "echo(1): next");
    }

    #[tokio::test]
    async fn test_sessions_have_separate_histories() {
        let app = TestApp::new(AppConfig::default()).await;
        let alice = app.login_as("alice").await;
        let bob = app.login_as("bobby").await;

        app.post_chat(r#"{"message": "one"}"#, Some(&alice)).await;
        let response = app.post_chat(r#"{"message": "two"}"#, Some(&alice)).await;
        assert_eq!(body_json(response).await["response"], "echo(3): two");

        let response = app.post_chat(r#"{"message": "first"}"#, Some(&bob)).await;
        assert_eq!(body_json(response).await["response"], "echo(1): first");
    }

    #[tokio::test]
    async fn test_logout_ends_conversation() {
        let app = TestApp::new(AppConfig::default()).await;
        let cookie = app.login_as("alice").await;
        app.post_chat(r#"{"message": "remember me"}"#, Some(&cookie)).await;
        assert_eq!(app.state.chat_service.conversations().len(), 1);

        app.post_form("/logout", "", Some(&cookie)).await;
        assert!(app.state.chat_service.conversations().is_empty());
    }

    /// Backdate the login sessions of `username` (or everyone) so they are expired.
    async fn expire_sessions(app: &TestApp, username: Option<&str>) {
        let query = match username {
            Some(username) => {
                let user = app
                    .state
                    .auth_service
                    .users()
                    .get_by_username(username)
                    .await
                    .unwrap()
                    .unwrap();
                sqlx::query(
                    "UPDATE auth_sessions SET expires_at = '2000-01-01T00:00:00.000000Z' WHERE user_id = ?",
                )
                .bind(user.id.to_string())
            }
            None => sqlx::query(
                "UPDATE auth_sessions SET expires_at = '2000-01-01T00:00:00.000000Z'",
            ),
        };
        query.execute(&app.state.db_pool.writer).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_ends_conversation() {
        let app = TestApp::new(AppConfig::default()).await;
        let cookie = app.login_as("alice").await;
        app.post_chat(r#"{"message": "remember me"}"#, Some(&cookie)).await;
        assert_eq!(app.state.chat_service.conversations().len(), 1);

        expire_sessions(&app, None).await;

        let response = app.get("/chat", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("/login"));
        assert!(app.state.chat_service.conversations().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_purges_expired_sessions_and_conversations() {
        let app = TestApp::new(AppConfig::default()).await;
        let alice = app.login_as("alice").await;
        let bob = app.login_as("bobby").await;
        app.post_chat(r#"{"message": "hi"}"#, Some(&alice)).await;
        app.post_chat(r#"{"message": "hi"}"#, Some(&bob)).await;
        assert_eq!(app.state.chat_service.conversations().len(), 2);

        // Alice never comes back, so only the sweep can reclaim her conversation.
        expire_sessions(&app, Some("alice")).await;

        assert_eq!(app.state.sweep_expired_sessions().await.unwrap(), 1);
        assert_eq!(app.state.chat_service.conversations().len(), 1);
        assert_eq!(app.state.sweep_expired_sessions().await.unwrap(), 0);

        // Bob's session and history survive.
        let response = app.post_chat(r#"{"message": "again"}"#, Some(&bob)).await;
        assert_eq!(body_json(response).await["response"], "echo(3): again");
    }

    #[tokio::test]
    async fn test_transcripts_persisted_when_enabled() {
        let mut config = AppConfig::default();
        config.chat.persist_transcripts = true;
        let app = TestApp::new(config).await;
        let cookie = app.login_as("alice").await;

        app.post_chat(r#"{"message": "hello"}"#, Some(&cookie)).await;
        app.post_chat(r#"{"message": "fail"}"#, Some(&cookie)).await;

        let user = app
            .state
            .auth_service
            .users()
            .get_by_username("alice")
            .await
            .unwrap()
            .unwrap();
        let messages = SqliteMessageRepository::new(app.state.db_pool.clone());
        let rows = messages.list_messages(&user.id, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].content, "hello");
        assert_eq!(rows[0].response.as_deref(), Some("echo(1): hello"));
    }

    #[tokio::test]
    async fn test_transcripts_not_persisted_by_default() {
        let app = TestApp::new(AppConfig::default()).await;
        let cookie = app.login_as("alice").await;
        app.post_chat(r#"{"message": "hello"}"#, Some(&cookie)).await;

        let user = app
            .state
            .auth_service
            .users()
            .get_by_username("alice")
            .await
            .unwrap()
            .unwrap();
        let messages = SqliteMessageRepository::new(app.state.db_pool.clone());
        assert!(messages.list_messages(&user.id, None).await.unwrap().is_empty());
    }
}
