//! Forecast CLI
//!
//! Local execution entry point. For AWS Lambda, use `forecast-ingest-lambda`
//! and `forecast-api-lambda`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use forecast::{
    api::{self, ApiState},
    config::{self, DEFAULT_CONFIG_PATH},
    error::{AppError, Result},
    pipeline::{Clock, IngestionOrchestrator, SystemClock},
    services::QueryResolver,
};

/// Bureau of Meteorology forecast ingester and lookup service
#[derive(Parser, Debug)]
#[command(
    name = "forecast",
    version,
    about = "Ingest BoM state forecasts and look them up by location"
)]
struct Cli {
    /// Path to the TOML config file (default: $FORECAST_CONFIG or data/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, normalize and store forecasts for the configured states
    Ingest {
        /// Only ingest these state codes (repeatable)
        #[arg(short, long = "state")]
        states: Vec<String>,
    },

    /// Look up one forecast, e.g. `query "Richmond, vic" --date 20230601`
    Query {
        location: String,

        /// Compact date, YYYYMMDD (default: today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Serve the query API over HTTP
    Serve {
        /// Listen address (default: server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// List stored records dated before a day
    Stale {
        /// ISO date, YYYY-MM-DD (default: today)
        #[arg(long)]
        before: Option<NaiveDate>,
    },

    /// Validate the configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let path = cli.config;
    let load = || config::load_runtime_config(path.as_deref());

    match cli.command {
        Command::Ingest { states } => {
            let config = load()?;
            let states = config.selected_states(&states);
            if states.is_empty() {
                return Err(AppError::config("No matching states configured"));
            }

            let report = IngestionOrchestrator::from_config(&config)
                .await?
                .run(&states)
                .await;

            println!("{}", serde_json::to_string_pretty(&report)?);

            let failed = report.failed_states();
            if !failed.is_empty() {
                log::warn!("Ingestion finished with failures: {}", failed.join(", "));
            } else {
                log::info!("Ingestion complete!");
            }
        }

        Command::Query { location, date } => {
            let config = load()?;
            let resolver = QueryResolver::from_config(&config).await?;
            let record = resolver.resolve(&location, date.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Command::Serve { bind } => {
            let config = load()?;
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let resolver = QueryResolver::from_config(&config).await?;
            api::serve(&bind, ApiState::new(resolver)).await?;
        }

        Command::Stale { before } => {
            let config = load()?;
            let before = match before {
                Some(date) => date,
                None => SystemClock::new(config.clock.offset()?).today(),
            };
            let resolver = QueryResolver::from_config(&config).await?;
            let stale = resolver.stale_before(before).await?;

            log::info!("{} record(s) dated before {}", stale.len(), before);
            println!("{}", serde_json::to_string_pretty(&stale)?);
        }

        Command::Validate => validate(path.clone())?,
    }

    Ok(())
}

fn validate(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| {
        std::env::var("FORECAST_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
            .into()
    });
    log::info!("Validating {}...", path.display());

    let mut config = forecast::models::Config::load(&path)?;
    config::apply_overrides(&mut config, |name| std::env::var(name).ok())?;

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    log::info!(
        "Config OK: {} state(s), {:?} transport, {:?} store",
        config.feed.states.len(),
        config.feed.transport,
        config.store.backend
    );
    Ok(())
}
