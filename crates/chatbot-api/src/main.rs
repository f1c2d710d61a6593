//! Chatbot web service and admin CLI entry point.
//!
//! Binary name: `chatbot`
//!
//! Parses CLI arguments, initializes tracing, then either starts the web
//! server or runs a local administration command against the database.

mod cli;
mod http;
mod state;

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use chatbot_infra::config::{ensure_data_dir, load_config, require_api_key, resolve_data_dir};
use chatbot_infra::llm::create_provider;
use chatbot_infra::sqlite::pool::DatabasePool;
use chatbot_observe::tracing_setup::{
    TracingOptions, filter_for_verbosity, init_tracing, otel_enabled_from_env, shutdown_tracing,
};
use chatbot_types::config::AppConfig;

use cli::{Cli, Commands, UserCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = TracingOptions {
        default_filter: filter_for_verbosity(cli.verbose, cli.quiet),
        json: cli.json,
        otel: otel_enabled_from_env(),
    };
    init_tracing(&options).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host } => serve(host, port).await,

        Commands::User { action } => {
            let (pool, config) = open_database().await?;
            let auth = state::build_auth_service(&pool, &config);
            let result = match action {
                UserCommand::Create { username, password } => {
                    cli::user::create_user(&auth, &username, password, cli.json).await
                }
                UserCommand::Delete { username, force } => {
                    cli::user::delete_user(&auth, &username, force, cli.json).await
                }
            };
            pool.close().await;
            result
        }

        Commands::Messages { username, limit } => {
            let (pool, _) = open_database().await?;
            let result = cli::messages::list_messages(&pool, &username, limit, cli.json).await;
            pool.close().await;
            result
        }

        Commands::Transcript { session_id } => {
            let (pool, _) = open_database().await?;
            let result = cli::messages::show_transcript(&pool, &session_id, cli.json).await;
            pool.close().await;
            result
        }
    }
}

/// Resolve the data directory, load its config and open the database.
async fn open_database() -> anyhow::Result<(DatabasePool, AppConfig)> {
    let data_dir = resolve_data_dir()?;
    ensure_data_dir(&data_dir).await?;
    let config = load_config(&data_dir).await;
    let pool = open_pool(&data_dir).await?;
    Ok((pool, config))
}

async fn open_pool(data_dir: &Path) -> anyhow::Result<DatabasePool> {
    DatabasePool::open_in(data_dir)
        .await
        .with_context(|| format!("failed to open database in {}", data_dir.display()))
}

async fn serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    // Without a key no chat request could succeed; refuse to start.
    let api_key = require_api_key()?;

    let data_dir = resolve_data_dir()?;
    ensure_data_dir(&data_dir).await?;
    let mut config = load_config(&data_dir).await;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let provider = create_provider(&config.model, api_key)?;
    let state = AppState::init(data_dir, config, provider).await?;

    let purged = state.sweep_expired_sessions().await?;
    if purged > 0 {
        tracing::info!(purged, "removed expired login sessions");
    }
    let sweep_period = Duration::from_secs(state.config.session.sweep_interval_secs.max(1));
    let sweeper = state::spawn_session_sweeper(state.clone(), sweep_period);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    println!(
        "  {} Chatbot listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let db_pool = state.db_pool.clone();
    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    db_pool.close().await;
    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
///
/// A handler that cannot be installed never fires; the other still can.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
