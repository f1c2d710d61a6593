//! Application state wiring all services together.
//!
//! Services are generic over repository/hasher traits; AppState pins them to
//! the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chatbot_core::auth::service::AuthService;
use chatbot_core::chat::service::{ChatService, ChatSettings};
use chatbot_core::llm::box_provider::BoxChatProvider;
use chatbot_infra::crypto::password::Argon2PasswordHasher;
use chatbot_infra::crypto::token::RandomTokenGenerator;
use chatbot_infra::sqlite::message::SqliteMessageRepository;
use chatbot_infra::sqlite::pool::DatabasePool;
use chatbot_infra::sqlite::session::SqliteSessionRepository;
use chatbot_infra::sqlite::user::SqliteUserRepository;
use chatbot_types::config::AppConfig;
use chatbot_types::error::AuthError;

use crate::http::templates::Templates;

pub type ConcreteAuthService = AuthService<
    SqliteUserRepository,
    SqliteSessionRepository,
    Argon2PasswordHasher,
    RandomTokenGenerator,
>;

pub type ConcreteChatService = ChatService<SqliteMessageRepository>;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_pool: DatabasePool,
    pub auth_service: Arc<ConcreteAuthService>,
    pub chat_service: Arc<ConcreteChatService>,
    pub templates: Arc<Templates>,
}

impl AppState {
    /// Open the database in `data_dir` and wire every service around `provider`.
    pub async fn init(
        data_dir: PathBuf,
        config: AppConfig,
        provider: BoxChatProvider,
    ) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::open_in(&data_dir).await?;
        Self::from_parts(db_pool, config, provider)
    }

    /// Wire services over an already-open pool.
    pub fn from_parts(
        db_pool: DatabasePool,
        config: AppConfig,
        provider: BoxChatProvider,
    ) -> anyhow::Result<Self> {
        let auth_service = build_auth_service(&db_pool, &config);

        let chat_service = ChatService::new(
            provider,
            SqliteMessageRepository::new(db_pool.clone()),
            ChatSettings::from_config(&config.model, &config.chat),
            config.chat.max_history_turns,
        );

        let templates = Templates::new()?;

        Ok(Self {
            config: Arc::new(config),
            db_pool,
            auth_service: Arc::new(auth_service),
            chat_service: Arc::new(chat_service),
            templates: Arc::new(templates),
        })
    }

    /// Delete expired login sessions and drop the conversations they owned,
    /// then evict conversations idle for longer than a session can live.
    ///
    /// Returns how many sessions were purged.
    pub async fn sweep_expired_sessions(&self) -> Result<usize, AuthError> {
        let purged = self.auth_service.purge_expired_sessions().await?;
        for session in &purged {
            self.chat_service.end_conversation(&session.conversation_key());
        }

        let evicted = self
            .chat_service
            .conversations()
            .evict_idle(self.config.session.ttl());
        if evicted > 0 {
            tracing::info!(evicted, "evicted idle conversations");
        }

        Ok(purged.len())
    }
}

/// Run [`AppState::sweep_expired_sessions`] every `period` until aborted.
///
/// The first sweep happens one full period after spawning.
pub fn spawn_session_sweeper(state: AppState, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            if let Err(e) = state.sweep_expired_sessions().await {
                tracing::warn!(error = %e, "session sweep failed");
            }
        }
    })
}

/// The auth service alone, for CLI commands that never talk to the model.
pub fn build_auth_service(db_pool: &DatabasePool, config: &AppConfig) -> ConcreteAuthService {
    AuthService::new(
        SqliteUserRepository::new(db_pool.clone()),
        SqliteSessionRepository::new(db_pool.clone()),
        Argon2PasswordHasher::new(),
        RandomTokenGenerator::new(),
        chrono::Duration::hours(config.session.ttl_hours),
    )
}
