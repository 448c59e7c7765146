//! portfolio-stats entry point.
//!
//! Two modes: `serve` runs the daily rollup scheduler; `rollup` runs a
//! single recomputation and exits, non-zero on a job-fatal failure.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use portfolio_stats::config::StatsConfig;
use portfolio_stats::domain::PortfolioId;
use portfolio_stats::scheduler;
use portfolio_stats::service::RollupJob;
use portfolio_stats::store::postgres::PostgresStore;

#[derive(Debug, Parser)]
#[command(name = "stats", about = "Portfolio engagement statistics service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the daily rollup scheduler.
    Serve,
    /// Run one rollup and exit. Prints the report as JSON.
    Rollup {
        /// Trailing window in days; defaults to ROLLUP_WINDOW_DAYS.
        #[arg(long)]
        window_days: Option<u32>,
        /// Recompute a single portfolio instead of a full sweep.
        #[arg(long)]
        portfolio: Option<Uuid>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = StatsConfig::from_env();
    tracing::info!(
        window_days = config.rollup_window_days,
        rollup_hour = config.rollup_hour,
        "starting portfolio-stats"
    );

    // Connect storage
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await?;

    let store = Arc::new(PostgresStore::new(pool));
    store.migrate().await?;

    let job = RollupJob::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Duration::from_secs(config.rollup_portfolio_timeout_secs),
    );

    match cli.command {
        Command::Serve => {
            scheduler::run_daily(&job, config.rollup_window_days, config.rollup_hour).await?;
        }
        Command::Rollup {
            window_days,
            portfolio,
        } => {
            let window = window_days.unwrap_or(config.rollup_window_days);
            let report = job
                .run(window, portfolio.map(PortfolioId::from_uuid), chrono::Utc::now())
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
