//! claims-stage - Seed staging loader

use anyhow::Result;
use clap::Parser;
use claims_common::logging::{init_logging, LogConfig, LogLevel};
use claims_stage::{config::Config, ledger, loader};
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "claims-stage")]
#[command(author, version, about = "Healthcare-claims staging loader")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Load new seed files into the staging tables
    Load {
        /// Seed directory to scan (overrides SEED_DIR)
        #[arg(short, long)]
        seed_dir: Option<PathBuf>,

        /// Stop after the first failed file instead of continuing
        #[arg(long)]
        fail_fast: bool,
    },

    /// Apply pending database migrations
    Migrate,

    /// Show recent load batches from the ledger
    Status {
        /// Number of batches to show
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env().unwrap_or_default();
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }
    if log_config.filter_directives.is_none() {
        log_config.filter_directives = Some("sqlx=warn".to_string());
    }
    init_logging(&log_config)?;

    let config = Config::load()?;

    // A connection failure here is fatal for the whole run.
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .connect(&config.database.url)
        .await?;

    info!("Database connection pool established");

    match cli.command {
        Command::Load { seed_dir, fail_fast } => {
            let seed_dir = seed_dir.unwrap_or_else(|| config.loader.seed_dir.clone());
            let fail_fast = fail_fast || config.loader.fail_fast;

            let summary = loader::run(&pool, &seed_dir, fail_fast).await?;
            info!(
                files_found = summary.files_found,
                loaded = summary.loaded,
                skipped = summary.skipped,
                failed = summary.failed,
                total_rows = summary.total_rows,
                mismatch_warnings = summary.mismatch_warnings,
                "Run complete"
            );

            // Individual file failures only fail the process in fail-fast
            // mode; the continue-on-error default exits zero.
            if fail_fast && summary.failed > 0 {
                anyhow::bail!("aborted after failed file");
            }
        },

        Command::Migrate => {
            sqlx::migrate!("../../migrations").run(&pool).await?;
            info!("Database migrations completed");
        },

        Command::Status { limit } => {
            let batches = ledger::recent_batches(&pool, limit).await?;
            if batches.is_empty() {
                info!("No load batches recorded");
            }
            for batch in batches {
                info!(
                    load_id = batch.load_id,
                    source = %batch.source_name,
                    file = %batch.file_pattern,
                    status = %batch.status,
                    source_rows = batch.source_row_count,
                    rows = batch.row_count,
                    started_at = %batch.started_at,
                    "Load batch"
                );
            }
        },
    }

    Ok(())
}
