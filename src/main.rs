use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vidsaver::config::AppConfig;
use vidsaver::extractor::YtDlpExtractor;
use vidsaver::pool::WorkerPool;
use vidsaver::server::{router, AppState};
use vidsaver::status::StatusStore;

/// Initialize structured logging to stderr.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vidsaver=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_logging();

    let config = Arc::new(AppConfig::from_env());
    let store = StatusStore::open(&config.db_path).await?;
    let extractor = Arc::new(YtDlpExtractor::new(config.socket_timeout));
    let pool = Arc::new(WorkerPool::new(config.workers));
    info!(
        workers = pool.capacity(),
        delivery = ?config.delivery,
        "starting VidSaver API"
    );

    let state = AppState::new(
        Arc::clone(&config),
        extractor,
        Arc::clone(&pool),
        store,
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("listening on http://{}", config.bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let in-flight extractor calls finish before exiting.
    match Arc::try_unwrap(pool) {
        Ok(pool) => pool.shutdown().await,
        Err(_) => warn!("worker pool still referenced at shutdown, skipping drain"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
