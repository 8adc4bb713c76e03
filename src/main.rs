use anyhow::{Context, Result};
use argus_defense::classifier::ScoringStrategy;
use argus_defense::config::Config;
use argus_defense::db::Database;
use argus_defense::ingest::ImportWindow;
use argus_defense::logging::configure_logging;
use argus_defense::monitor::{Monitor, MonitorState};
use argus_defense::pipeline::Pipeline;
use argus_defense::TARGET_MONITOR;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about = "Defense news monitoring and threat classification", long_about = None)]
struct Cli {
    /// SQLite database path (overrides DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<String>,

    /// Concurrent section scans (overrides FETCH_WORKERS)
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Scoring strategy: full or quick (overrides SCORING_STRATEGY)
    #[arg(long, global = true)]
    strategy: Option<ScoringStrategy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single fetch, classify and store cycle
    Cycle,

    /// Run cycles continuously until interrupted
    Monitor {
        /// Seconds between cycles (overrides MONITOR_INTERVAL_SECS)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Print aggregate intelligence statistics as JSON
    Report {
        /// Number of recent alerts to include
        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Import a directory of raw article JSON files
    Process {
        /// Directory containing the files
        dir: PathBuf,
    },

    /// Re-classify every stored article from its stored content
    Recompute,

    /// Classify a piece of text and print the result
    Classify {
        /// Text to classify
        text: String,
    },
}

fn apply_overrides(cli: &Cli, mut config: Config) -> Config {
    if let Some(database) = &cli.database {
        config.database_path = database.clone();
    }
    if let Some(workers) = cli.workers {
        config.fetch.max_workers = workers.max(1);
    }
    if let Some(strategy) = cli.strategy {
        config.scoring = strategy;
    }
    config
}

async fn open_database(config: &Config) -> Result<Database> {
    Database::new(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path))
}

fn pipeline(config: &Config) -> Pipeline {
    Pipeline::new(
        config.scoring,
        std::sync::Arc::new(argus_defense::entity::PatternEntityExtractor),
        config.fetch.min_content_length,
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    configure_logging();

    let cli = Cli::parse();
    let config = apply_overrides(&cli, Config::from_env());

    match cli.command {
        Commands::Cycle => {
            let monitor = Monitor::from_config(config).context("Failed to build HTTP client")?;
            let (_, stats) = monitor.run_cycle(MonitorState::default()).await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            if let Some(reason) = stats.aborted {
                anyhow::bail!("cycle aborted: {}", reason);
            }
        }

        Commands::Monitor { interval } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or(config.monitor_interval);
            let monitor = Monitor::from_config(config).context("Failed to build HTTP client")?;

            let (cancel_tx, cancel_rx) = watch::channel(false);
            tokio::spawn(async move {
                if signal::ctrl_c().await.is_err() {
                    error!(target: TARGET_MONITOR, "Failed to listen for ctrl-c");
                }
                info!(target: TARGET_MONITOR, "Shutdown requested, finishing current cycle");
                let _ = cancel_tx.send(true);
            });

            let state = monitor.run(interval, cancel_rx).await;
            println!("Stopped after {} cycles", state.cycle_count);
        }

        Commands::Report { limit } => {
            let db = open_database(&config).await?;
            let report = db
                .report(&Utc::now(), limit.unwrap_or(config.recent_alerts_limit))
                .await
                .context("Failed to build report")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Process { dir } => {
            let db = open_database(&config).await?;
            let stats = pipeline(&config)
                .process_directory(&db, &dir, &ImportWindow::default())
                .await
                .with_context(|| format!("Failed to import {}", dir.display()))?;
            println!(
                "Processed {} articles ({} skipped, {} errors)",
                stats.processed, stats.skipped, stats.errored
            );
        }

        Commands::Recompute => {
            let db = open_database(&config).await?;
            let stats = pipeline(&config)
                .recompute_all(&db)
                .await
                .context("Recompute failed")?;
            println!(
                "Recomputed {} articles ({} errors)",
                stats.processed, stats.errored
            );
        }

        Commands::Classify { text } => {
            let (classification, entities) = pipeline(&config).analyze(&text);
            println!("{}", serde_json::to_string_pretty(&classification)?);
            for entity in entities {
                println!("{:<14} {:<9} {}", entity.entity_type, entity.category, entity.text);
            }
        }
    }

    Ok(())
}
