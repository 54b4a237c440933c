//! `contrib` command-line entry point.
//!
//! # Responsibility
//! - Open the contribution store described by flags and `contrib.toml`.
//! - Record import runs, prune explicitly, and print the project list.
//!
//! # Invariants
//! - Flags override config file values.
//! - Output on stdout is JSON only; diagnostics go to the log file.

mod import;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contrib_core::db::open_db;
use contrib_core::{
    default_log_level, init_logging, load_config_or_default, new_run_id,
    ContributionSyncService, CoreConfig,
};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "contrib")]
#[command(version)]
#[command(about = "Record contribution runs and print the project contribution list")]
struct Cli {
    /// Path to the SQLite database (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Path to a TOML config file (default: ./contrib.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files (overrides config)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error (overrides config)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply migrations
    Init,

    /// Record one collection run from a JSON document, then prune stale rows
    Import {
        /// JSON document with projects, contributors and contributions
        file: PathBuf,

        /// Run id to tag contributions with (default: new UUID)
        #[arg(long)]
        run_id: Option<String>,

        /// Upsert catalog, contributions and prune inside one transaction
        #[arg(long)]
        atomic: bool,
    },

    /// Delete every contribution not tagged with the given run id
    Prune {
        #[arg(long)]
        run_id: String,
    },

    /// Print the project list as JSON, newest activity first
    List {
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    start_logging(&config)?;

    let mut conn = open_db(&config.database_path).with_context(|| {
        format!(
            "failed to open contribution store {}",
            config.database_path.display()
        )
    })?;

    match cli.command {
        Commands::Init => {
            println!(
                "{}",
                serde_json::json!({
                    "database": config.database_path.display().to_string(),
                    "status": "ready",
                })
            );
        }
        Commands::Import {
            file,
            run_id,
            atomic,
        } => {
            let document = import::read_document(&file)?;
            let run_id = run_id.unwrap_or_else(new_run_id);
            let report =
                import::run_import(&mut conn, &document, &run_id, atomic || config.atomic_run)?;
            println!(
                "{}",
                serde_json::json!({
                    "runId": report.run_id,
                    "upserted": report.upserted,
                    "pruned": report.pruned,
                })
            );
        }
        Commands::Prune { run_id } => {
            let pruned = ContributionSyncService::new(&conn, config.sync_options())
                .prune_stale(&run_id)
                .with_context(|| format!("prune for run {run_id} failed"))?;
            println!("{}", serde_json::json!({ "runId": run_id, "pruned": pruned }));
        }
        Commands::List { pretty } => {
            let projects = ContributionSyncService::new(&conn, config.sync_options())
                .list_projects()
                .context("failed to build project list")?;
            let output = if pretty {
                serde_json::to_string_pretty(&projects)?
            } else {
                serde_json::to_string(&projects)?
            };
            println!("{output}");
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<CoreConfig> {
    let mut config = load_config_or_default(cli.config.as_deref())?;
    if let Some(db) = &cli.db {
        config.database_path = db.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = Some(level.clone());
    }
    config.validate()?;
    Ok(config)
}

fn start_logging(config: &CoreConfig) -> Result<()> {
    let Some(dir) = &config.log_dir else {
        return Ok(());
    };
    let level = config.log_level.as_deref().unwrap_or(default_log_level());
    let dir = dir
        .to_str()
        .with_context(|| format!("log dir {} is not valid UTF-8", dir.display()))?;
    init_logging(level, dir).map_err(anyhow::Error::msg)?;
    info!(
        "event=cli_start module=cli status=ok version={}",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}
