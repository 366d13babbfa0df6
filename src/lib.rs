pub mod commands;
pub mod core;
pub mod logging;

use tracing::error;

use crate::commands::Cli;
use crate::core::config::LauncherConfig;
use crate::core::error::LauncherResult;
use crate::core::state::AppState;

/// Load config, start logging and run the selected command. Returns the
/// process exit code.
pub async fn run(cli: Cli) -> i32 {
    let config_path = cli.config.clone().unwrap_or_else(LauncherConfig::default_path);
    let config = match LauncherConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Could not load {}: {}", config_path.display(), e);
            return 2;
        }
    };

    let _guard = match logging::init_logging(&config.paths().logs_dir(), cli.verbose) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("File logging disabled: {}", e);
            None
        }
    };

    tracing::info!("Genecraft launcher starting...");
    match start(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            1
        }
    }
}

async fn start(cli: Cli, config: LauncherConfig) -> LauncherResult<i32> {
    let state = AppState::new(config)?;
    commands::run(cli.command, state).await
}
