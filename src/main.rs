mod config;
mod engine;
mod languages;
mod runner;
mod server;
mod workspace;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::engine::ExecutionEngine;
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("codex=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    // Load language configurations
    let languages = languages::init_languages(config.languages_path.as_deref())?;
    match &config.languages_path {
        Some(path) => info!("Loaded language configurations from {}", path.display()),
        None => info!("Loaded built-in language configurations"),
    }
    info!("Supported languages: {:?}", languages.supported());

    tokio::fs::create_dir_all(&config.temp_dir)
        .await
        .with_context(|| format!("Failed to create temp dir {}", config.temp_dir.display()))?;
    info!(
        "Writing submissions to {} (prefix {:?})",
        config.temp_dir.display(),
        config.file_prefix
    );

    match config.run_timeout {
        Some(timeout) => info!("Run timeout: {}ms", timeout.as_millis()),
        None => warn!("Run timeout disabled; programs may run forever"),
    }

    let engine = ExecutionEngine::new(&config.temp_dir, config.file_prefix.clone(), languages);
    let shutdown = CancellationToken::new();

    let app = server::router(AppState {
        engine: Arc::new(engine),
        languages,
        run_timeout: config.run_timeout,
        shutdown: shutdown.clone(),
    });

    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting Codex on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Codex stopped");
    Ok(())
}

/// Resolves on Ctrl-C and cancels every in-flight run
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
    shutdown.cancel();
}
