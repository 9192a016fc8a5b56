use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imei-resolver")]
#[command(about = "Resolve full or 14-digit IMEIs to device brand and model")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to an additional configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Look up device information for a list of IMEIs
    Lookup {
        /// IMEIs to resolve (14 digits = check digit unknown)
        imeis: Vec<String>,

        /// Read IMEIs from a file, one per line ("-" for stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// API key for the lookup service (saved for later runs)
        #[arg(short = 'k', long)]
        api_key: Option<String>,

        /// Write resolved devices to this file
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Export format: csv, txt or json (default: from extension or config)
        #[arg(long)]
        format: Option<String>,

        /// Override the number of IMEIs resolved at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Output format for results: table or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// Compute the check digit for a 14-digit IMEI base
    CheckDigit {
        base: String,
    },

    /// Check whether a 15-digit IMEI has a valid check digit
    Validate {
        imei: String,
    },

    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Show previously resolved devices
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Export the listed entries to a file
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Show lookup statistics
    Stats {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Initialize database and show configuration
    Init,
}

#[derive(Subcommand)]
pub enum KeyAction {
    /// Store an API key
    Set { key: String },

    /// Show the stored key (masked)
    Show,

    /// Remove the stored key
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}
