//! # Scheme CLI Module
//!
//! ## Available Commands
//!
//! - `parse` - Parse a label key and show its parts
//! - `load` - Load JSON records into a schema and summarize it

mod commands;

use clap::{Parser, Subcommand};
use scheme::AppConfig;
use scheme_core::SchemeError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Scheme - label-addressed records, documents and relations
#[derive(Parser, Debug)]
#[command(name = "scheme")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the TOML config file (default: ./scheme.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a canonical label key
    Parse {
        /// Label text, e.g. "(doc:[default])/(nod:[1])"
        text: String,
    },

    /// Load records from a JSON file
    Load {
        /// Path to the input file (object of scope -> records)
        #[arg(short, long)]
        file: PathBuf,

        /// Print the whole schema as JSON
        #[arg(long)]
        dump: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli, config: &AppConfig) -> Result<(), SchemeError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Parse { text } => cmd_parse(config, &text, json_mode),
        Commands::Load { file, dump } => cmd_load(config, &file, json_mode, dump),
    }
}
