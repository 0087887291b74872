//! ytfetchd - locally-hosted media-acquisition service.
//!
//! Drives an external extractor CLI subprocess per job, tracking
//! progress, filenames, and naming templates over a small HTTP surface.

use std::sync::Arc;

use tracing::{error, info, warn};

use ytfetchd::api::server::{ApiServer, ApiServerConfig, AppState};
use ytfetchd::extractor::ExtractorDriver;
use ytfetchd::logging::init_logging;
use ytfetchd::orchestrator::JobOrchestrator;
use ytfetchd::progress::JobRegistry;
use ytfetchd::settings::SettingsStore;
use ytfetchd::size_estimator::SizeEstimator;

#[tokio::main]
async fn main() -> ytfetchd::Result<()> {
    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let _guard = init_logging(&log_dir)?;

    info!("Starting ytfetchd v{}", env!("CARGO_PKG_VERSION"));

    let working_dir = std::env::current_dir()?;
    let extractor_program = std::env::var("EXTRACTOR_PROGRAM").unwrap_or_else(|_| "yt-dlp".to_string());

    let registry = Arc::new(JobRegistry::new());
    let driver = Arc::new(ExtractorDriver::new(extractor_program.clone()));
    let orchestrator = Arc::new(JobOrchestrator::new(registry.clone(), driver, working_dir.clone()));
    let size_estimator = Arc::new(SizeEstimator::new(extractor_program));
    let settings_store = Arc::new(SettingsStore::new(&working_dir));

    let state = AppState::new(registry, orchestrator, size_estimator, settings_store, working_dir);
    let config = ApiServerConfig::from_env_or_default();
    let server = ApiServer::new(config, state);
    let cancel_token = server.cancel_token();

    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("API server error: {e}");
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), initiating shutdown...");
        }
        _ = wait_for_sigterm() => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cancel_token.cancel();
    if let Err(e) = server_handle.await {
        warn!("API server task panicked during shutdown: {e}");
    }

    info!("ytfetchd shutdown complete");
    Ok(())
}

/// Wait for SIGTERM (Unix only).
#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
    sigterm.recv().await;
}

/// On non-Unix platforms SIGTERM doesn't exist; the ctrl_c handler above
/// is the only shutdown path.
#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await;
}
