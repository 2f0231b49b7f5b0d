// claude2gemini - Anthropic Messages API to Google Gemini translation proxy

use anyhow::Result;
use clap::Parser;
use claude2gemini::cache::ContentCache;
use claude2gemini::cli::Args;
use claude2gemini::config::AppConfig;
use claude2gemini::gemini::GeminiClient;
use claude2gemini::server::create_router;
use claude2gemini::utils::logging;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let config = AppConfig::load(args.config.as_deref())?;

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting claude2gemini v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Build the runtime sized from config
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers.max(1))
        .enable_all()
        .build()?;

    runtime.block_on(run(config))
}

async fn run(config: AppConfig) -> Result<()> {
    if config.gemini.api_key.is_empty() {
        warn!("No Gemini API key configured; set CLAUDE2GEMINI__GEMINI__API_KEY");
    }

    // Phase 4: Build the backend client and its content cache
    let cache = Arc::new(ContentCache::new(config.cache.clone()));
    let gemini_client = GeminiClient::new(&config.gemini, cache)?;
    info!(
        big_model = %config.models.big_model,
        small_model = %config.models.small_model,
        workers = config.server.workers,
        "Model routing configured"
    );

    // Phase 5: Build and start HTTP server
    let app = create_router(config.clone(), gemini_client)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 6: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
