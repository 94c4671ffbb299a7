//! threadwatch CLI
//!
//! Runs the monitor loop, a single cycle, or small administrative commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use threadwatch::{
    error::{AppError, Result},
    models::Config,
    pipeline::{Monitor, Scheduler},
    storage::open_store,
};

/// Longest wait for an in-flight cycle after Ctrl-C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// threadwatch - forum thread and comment monitor
#[derive(Parser, Debug)]
#[command(
    name = "threadwatch",
    version,
    about = "Watches forum threads and comments and sends filtered notifications"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run cycles on the configured interval until interrupted
    Run,

    /// Run a single cycle and print its report
    Once,

    /// Validate the configuration file
    Validate,

    /// Show what the store knows about a thread
    Lookup {
        /// Thread URL
        link: String,
    },
}

/// Initialize logging from the verbosity flag and configured level.
fn init_logging(verbose: bool, configured: &str) {
    let level = if verbose { "debug" } else { configured };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            init_logging(cli.verbose, "info");
            log::error!("Failed to load {}: {}", cli.config.display(), e);
            return Err(e);
        }
    };
    init_logging(cli.verbose, &config.logging.level);

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Validate => {
            log::info!(
                "Config OK: {} feeds, {} direct threads, every {}s",
                config.monitor.urls.len(),
                config.monitor.extra_urls.len(),
                config.monitor.frequency().as_secs()
            );
        }

        Command::Lookup { link } => {
            let store = open_store(&config.storage)?;
            match store.find_thread(&link).await? {
                Some(thread) => {
                    println!("{}", serde_json::to_string_pretty(&thread)?);
                }
                None => {
                    log::warn!("No stored thread for {}", link);
                    return Err(AppError::validation(format!("thread not found: {link}")));
                }
            }
        }

        Command::Once => {
            let store = open_store(&config.storage)?;
            let monitor = Monitor::from_config(&config, store)?;
            let report = monitor.run_cycle().await;
            println!("{report}");
        }

        Command::Run => {
            let store = open_store(&config.storage)?;
            let monitor = Arc::new(Monitor::from_config(&config, store)?);
            let scheduler = Scheduler::start(Arc::clone(&monitor));

            wait_for_shutdown(&monitor, &cli.config).await?;

            log::info!(
                "Stopping; waiting up to {}s for the current cycle",
                SHUTDOWN_GRACE.as_secs()
            );
            if tokio::time::timeout(SHUTDOWN_GRACE, scheduler.stop())
                .await
                .is_err()
            {
                log::warn!("Cycle still running after grace period; exiting anyway");
            }
        }
    }

    Ok(())
}

/// Block until Ctrl-C, reloading the configuration on SIGHUP.
#[cfg(unix)]
async fn wait_for_shutdown(monitor: &Monitor, config_path: &Path) -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => return Ok(result?),
            _ = hangup.recv() => reload(monitor, config_path).await,
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_monitor: &Monitor, _config_path: &Path) -> Result<()> {
    Ok(tokio::signal::ctrl_c().await?)
}

#[cfg(unix)]
async fn reload(monitor: &Monitor, config_path: &Path) {
    log::info!("SIGHUP received; reloading {}", config_path.display());
    let result = match Config::load_validated(config_path) {
        Ok(config) => monitor.reconfigure(&config).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        log::error!("Reload rejected, keeping current configuration: {}", e);
    }
}
