use std::path::Path;

use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::error::{LauncherError, LauncherResult};

/// Console plus a per-session file under `log_dir`. `RUST_LOG` overrides the
/// default filter. Keep the guard alive until exit or buffered lines are lost.
pub fn init_logging(log_dir: &Path, verbose: bool) -> LauncherResult<WorkerGuard> {
    std::fs::create_dir_all(log_dir).map_err(|e| LauncherError::io(log_dir, e))?;

    let file_name = format!("{}.log", Local::now().format("%Y-%m-%d-%H-%M-%S"));
    let (file_writer, guard) = tracing_appender::non_blocking(rolling::never(log_dir, &file_name));

    let default_filter = if verbose {
        "info,genecraft_lib=debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .map_err(|e| LauncherError::Other(format!("logging already initialised: {}", e)))?;

    tracing::info!("Logging to {:?}", log_dir.join(&file_name));
    Ok(guard)
}
