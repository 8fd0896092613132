//! Command line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Value-mapping fault localization for instrumentable modules
#[derive(Debug, Parser)]
#[command(name = "ivmp", version, about)]
pub struct Cli {
    /// Project manifest
    #[arg(short, long, default_value = "ivmp.json", global = true)]
    pub manifest: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Instrument every production module of the manifest
    Rewrite {
        /// Backup directory, overriding the manifest
        #[arg(long)]
        backup_dir: Option<PathBuf>,
    },

    /// Record a baseline, search for fixing substitutions and rank sites
    Localize {
        /// Backup directory, overriding the manifest
        #[arg(long)]
        backup_dir: Option<PathBuf>,

        /// Instruction budget per test run, overriding the manifest
        #[arg(long)]
        step_limit: Option<u64>,

        /// Only run tests whose id matches this regular expression
        #[arg(short, long)]
        filter: Option<String>,

        /// Write the JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use the modules as they are instead of rewriting them first
        #[arg(long)]
        skip_rewrite: bool,
    },

    /// Describe module binaries
    Inspect {
        /// Module binaries
        files: Vec<PathBuf>,

        /// Also describe every `.ivm` file below this directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}
