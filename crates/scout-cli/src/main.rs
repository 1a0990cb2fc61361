mod cli;
mod commands;
mod config;

use clap::Parser;
use cli::Cli;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("scout: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli);

    let mut config = config::load_config(cli.config.as_deref())?;
    apply_cli_overrides(&mut config, &cli);
    config.validate()?;

    let database = config
        .database
        .clone()
        .ok_or_else(|| anyhow::anyhow!("no database path given (positional arg, SCOUT_DATABASE, or DATABASE config key)"))?;

    commands::serve::execute(&database, &config).await
}

/// Initializes structured logging, optionally to `--logfile` instead of
/// stderr. Returns the non-blocking writer's flush guard, which must live
/// for the duration of `main`.
fn init_logging(cli: &Cli) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };

    match &cli.logfile {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path.file_name().and_then(|f| f.to_str()).unwrap_or("scout.log");
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
            None
        }
    }
}

/// CLI flags win over config file and environment, matching spec.md §6's
/// precedence order.
fn apply_cli_overrides(config: &mut config::Config, cli: &Cli) {
    if let Some(database) = &cli.database {
        config.database = Some(PathBuf::from(database));
    }
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(prefix) = &cli.url_prefix {
        config.url_prefix = prefix.clone();
    }
    if let Some(stem) = &cli.stem {
        config.stem = stem.clone();
    }
    if cli.debug {
        config.debug = true;
    }
    if let Some(paginate_by) = cli.paginate_by {
        config.paginate_by = paginate_by;
    }
    if let Some(api_key) = &cli.api_key {
        config.authentication = Some(api_key.clone());
    }
    if let Some(cache_size) = cli.cache_size {
        config.sqlite_pragmas.cache_size_mb = cache_size;
    }
    if cli.fsync {
        config.sqlite_pragmas.fsync = true;
    }
    if let Some(journal_mode) = &cli.journal_mode {
        config.sqlite_pragmas.journal_mode = journal_mode.clone();
    }
}
