//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Authenticated client for the council/DxO research gateway
#[derive(Parser, Debug)]
#[command(name = "council-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "COUNCIL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "COUNCIL_LOG_LEVEL", global = true)]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "COUNCIL_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in via the browser
    Login,

    /// Clear the local session
    Logout,

    /// Show authentication status
    Status,

    /// Refresh the access token
    Refresh,

    /// Ask the research backend a question
    Ask {
        /// Research mode
        #[arg(value_enum)]
        mode: AskMode,

        /// The question to ask
        question: String,
    },

    /// List the gateway's tools
    Tools,

    /// Probe gateway health
    Health,
}

/// Research modes exposed by the gateway
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AskMode {
    /// Multi-member council with ranking and synthesis
    Council,
    /// DxO workflow analysis
    Dxo,
}
