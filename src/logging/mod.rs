//! Logging setup: an `EnvFilter` seeded from `RUST_LOG` (falling back to a
//! default directive), an ANSI console layer, and a non-blocking daily
//! rolling-file layer. No reload handle and no broadcast layer — there is
//! no diagnostics UI in this service to feed.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter directive used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "ytfetchd=info,tower_http=info";

/// Initialize the global subscriber. Returns the file-appender's
/// `WorkerGuard`, which must be kept alive for the process lifetime for
/// buffered log lines to be flushed on shutdown.
pub fn init_logging(log_dir: impl AsRef<Path>) -> crate::Result<WorkerGuard> {
    let log_path = PathBuf::from(log_dir.as_ref());
    std::fs::create_dir_all(&log_path)?;

    let file_appender = tracing_appender::rolling::daily(&log_path, "ytfetchd.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .map_err(|e| crate::Error::Validation(format!("failed to install logging subscriber: {e}")))?;

    Ok(guard)
}
