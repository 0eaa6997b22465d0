pub mod toml_config;

use crate::utils::error::Result;
use std::path::Path;
use toml_config::TarotConfig;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

pub const DEFAULT_CONFIG_FILE: &str = "tarot.toml";

/// Loads `path`, or `tarot.toml` when present, or the built-in defaults.
pub fn load_config(path: Option<&str>) -> Result<TarotConfig> {
    match path {
        Some(path) => TarotConfig::from_file(path),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            TarotConfig::from_file(DEFAULT_CONFIG_FILE)
        }
        None => Ok(TarotConfig::default()),
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "tarot")]
#[command(about = "Tarot readings shuffled with quantum random numbers")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Serve the web game and its API routes
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        static_dir: Option<String>,
    },
    /// Draw a reading in the terminal
    Draw {
        #[arg(short, long)]
        question: String,

        #[arg(short = 'n', long, default_value_t = 3)]
        count: usize,

        /// Ask the interpretation provider for a reading
        #[arg(long)]
        interpret: bool,
    },
}
