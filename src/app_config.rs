//! Application configuration and CLI argument parsing
//!
//! This module handles all command-line interface definitions and
//! argument parsing for the stampede binary.

use clap::{Parser, Subcommand};

/// Command-line interface definition for Stampede
#[derive(Parser)]
#[command(name = "stampede")]
#[command(about = "Synthetic load generator for session-oriented web APIs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the run configuration file
    #[arg(short, long, default_value = "stampede.toml")]
    pub config: String,

    #[arg(short, long)]
    pub verbose: bool,
}

/// Available commands for the Stampede CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Run a load test against the configured target
    Run {
        /// Override the configured run duration in seconds
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Override the configured RNG seed for deterministic replay
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Load and validate the configuration, then exit
    CheckConfig,

    /// Print a default configuration file to stdout
    SampleConfig,
}

impl Commands {
    /// Check if this command needs a configuration file on disk
    pub fn requires_config(&self) -> bool {
        matches!(self, Commands::Run { .. } | Commands::CheckConfig)
    }
}
