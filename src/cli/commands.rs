//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hazard data collection pipeline CLI
#[derive(Parser, Debug)]
#[command(name = "hazard-pipeline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory containing declarative source YAML documents
    #[arg(short, long, global = true, default_value = "sources")]
    pub sources_dir: PathBuf,

    /// Redis cache URL; without it an in-process cache is used
    #[arg(long, global = true, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Skip the built-in bespoke collectors
    #[arg(long, global = true)]
    pub skip_builtin: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the scheduler and run all collectors until interrupted
    Run {
        /// Start every collector immediately instead of staggering
        #[arg(long)]
        no_stagger: bool,
    },

    /// Run a single collector once and print the run result
    Once {
        /// Collector name
        name: String,
    },

    /// List all configured collectors and their schedules
    List,

    /// Parse and validate every source document, reporting per file
    Validate,
}
