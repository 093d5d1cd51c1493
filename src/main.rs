use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use datalake::cli::{chatgpt, claude, memory, stats, voice};
use datalake::config::Config;
use datalake::store::DatalakeStore;

#[derive(Parser)]
#[command(name = "datalake")]
#[command(about = "Personal activity log ingestion and reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "datalake.yaml")]
    config: String,

    /// Override the source device name from the config
    #[arg(long)]
    device: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import data from a source
    Import {
        #[command(subcommand)]
        source: ImportCommands,
    },

    /// Show statistics
    Stats,
}

#[derive(Subcommand)]
enum ImportCommands {
    /// Import a ChatGPT export zip
    Chatgpt {
        /// Path to the export zip
        zip: String,
    },

    /// Import Claude Code sessions and prompt history
    Claude,

    /// Import voice recordings and transcripts
    Voice,

    /// Import memory telemetry logs
    Memory,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Load config
    let mut config = Config::load(&cli.config).unwrap_or_default();
    if let Some(device) = cli.device {
        config.device = device;
    }

    // Initialize store
    let store = DatalakeStore::open(&config.database_path())?;

    match cli.command {
        Commands::Import { source } => match source {
            ImportCommands::Chatgpt { zip } => {
                let zip_path = shellexpand::tilde(&zip).to_string();
                chatgpt::run(&store, &config, std::path::Path::new(&zip_path))?;
            }
            ImportCommands::Claude => {
                claude::run(&store, &config)?;
            }
            ImportCommands::Voice => {
                voice::run(&store, &config)?;
            }
            ImportCommands::Memory => {
                memory::run(&store, &config)?;
            }
        },
        Commands::Stats => {
            stats::run(&store)?;
        }
    }

    Ok(())
}
