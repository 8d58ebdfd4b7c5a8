use super::toml_config::{TomlConfig, DEFAULT_CONFIG_FILE};
use crate::domain::ports::PersistMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "vehicle-rental")]
#[command(about = "Track vehicles, customers and rentals from the terminal")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory holding the vehicle, customer and rental record files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Persist each change before applying it in memory
    #[arg(long)]
    pub write_ahead: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List registered vehicles
    Vehicles {
        /// Only vehicles that can be rented right now
        #[arg(long)]
        available: bool,
        #[arg(long)]
        json: bool,
    },
    /// List registered customers
    Customers {
        #[arg(long)]
        json: bool,
    },
    /// Show rental history, optionally filtered
    History {
        /// Case-insensitive substring of the customer's name
        #[arg(long, conflicts_with = "plate")]
        customer: Option<String>,
        /// License plate of the vehicle
        #[arg(long)]
        plate: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

impl CliConfig {
    /// Command-line flags win over the file.
    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(data_dir) = &self.data_dir {
            tracing::debug!("data_dir overridden to {}", data_dir.display());
            config.storage.data_dir = data_dir.clone();
        }
        if self.write_ahead {
            config.storage.mode = PersistMode::WriteAhead;
        }
    }
}
