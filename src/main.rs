//! Recordstore CLI - command-line access to the record store

mod commands;

use clap::{Parser, Subcommand};
use recordstore::config::{default_data_dir_in, load_config};
use recordstore::ui;
use recordstore::StoreConfig;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "recordstore")]
#[command(version)]
#[command(about = "Connection-per-operation record store over a versioned SQLite database")]
#[command(long_about = r#"
Every command opens its own connection, runs one transaction and closes the
connection once the transaction commits.

Example usage:
  recordstore init
  recordstore add --second-id 1 --name "New Test data"
  recordstore find 1
  recordstore edit 1 --second-id 1 --name "Test data Edited"
  recordstore delete 1
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to recordstore.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the database files
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and ignore the data directory in git
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Open the database and run add, get, edit, get, delete on one record
    Demo,

    /// Add a record; its id is assigned by the store
    Add {
        /// Indexed secondary key
        #[arg(short, long)]
        second_id: i64,

        #[arg(short, long)]
        name: String,
    },

    /// Get one record by id
    Get { id: i64 },

    /// List every record
    List,

    /// Find records by secondary key
    Find { second_id: i64 },

    /// Replace the record with this id, creating it if absent
    Edit {
        id: i64,

        #[arg(short, long)]
        second_id: i64,

        #[arg(short, long)]
        name: String,
    },

    /// Delete a record by id (deleting a missing id succeeds)
    Delete { id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = load_config(cli.config.as_deref())?.unwrap_or_default();
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    } else if config.data_dir.is_none() {
        config.data_dir = Some(default_data_dir_in(&std::env::current_dir()?));
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    let config = resolve_config(&cli)?;

    let result = match cli.command {
        Commands::Init { force } => {
            commands::run_init(output_mode, cli.config.as_deref(), &config, force)
        }
        Commands::Demo => commands::run_demo(output_mode, config).await,
        Commands::Add { second_id, name } => {
            commands::run_add(output_mode, config, second_id, name).await
        }
        Commands::Get { id } => commands::run_get(output_mode, config, id).await,
        Commands::List => commands::run_list(output_mode, config).await,
        Commands::Find { second_id } => commands::run_find(output_mode, config, second_id).await,
        Commands::Edit { id, second_id, name } => {
            commands::run_edit(output_mode, config, id, second_id, name).await
        }
        Commands::Delete { id } => commands::run_delete(output_mode, config, id).await,
    };

    match result {
        Err(e) if output_mode.is_human() => {
            ui::error(&format!("{:#}", e));
            std::process::exit(1);
        }
        other => other,
    }
}
