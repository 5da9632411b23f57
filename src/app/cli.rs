//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Intention Engine - Replay interaction traces and inspect engine behavior
#[derive(Parser, Debug)]
#[command(name = "intent-engine")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded interaction trace through the engine
    Replay {
        /// Input trace file (JSONL)
        #[arg(short, long)]
        input: PathBuf,

        /// Write the session report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Canned preload payloads (JSON object keyed by preload key)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "hover.dwell_ms")
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "preload.ttl_ms")
        key: String,

        /// Value to set
        value: String,
    },

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
