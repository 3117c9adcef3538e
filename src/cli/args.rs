//! Command-line argument definitions
//!
//! This module defines all CLI arguments and subcommands using clap.

use crate::fingerprint::Fingerprint;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Find pixel-content duplicates among image and text pixel-array files
#[derive(Parser, Debug)]
#[command(name = "pixel-dedup")]
#[command(version)]
#[command(about = "Find pixel-content duplicates among image and text pixel-array files", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Fingerprint algorithm (overrides config). Snapshots do not record the
    /// algorithm, so use the one the snapshot was built with
    #[arg(short, long, global = true, value_parser = ["patch", "mean"])]
    pub algorithm: Option<String>,

    /// Duplicate policy (overrides config)
    #[arg(short, long, global = true, value_parser = ["append", "reject", "replace"])]
    pub policy: Option<String>,

    /// Snapshot file (overrides config)
    #[arg(short, long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace (overrides config)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fingerprint every supported file in the given folders and report duplicates
    Scan {
        /// Folders to scan
        #[arg(required = true, value_name = "FOLDER")]
        folders: Vec<PathBuf>,

        /// Start from an empty index instead of the saved snapshot
        #[arg(long)]
        fresh: bool,

        /// Only scan the top level of each folder
        #[arg(long)]
        no_recursive: bool,

        /// Do not save the snapshot afterwards
        #[arg(long)]
        no_save: bool,
    },

    /// Print both fingerprints of the given files without touching the index
    Hash {
        /// Files to fingerprint
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Add a single file to the index
    Add {
        /// File to add
        file: PathBuf,

        /// Store under this fingerprint instead of computing one
        #[arg(short, long)]
        key: Option<Fingerprint>,
    },

    /// Show duplicate groups stored in the snapshot
    Groups {
        /// Print the groups as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the files stored under a fingerprint
    Lookup {
        /// Fingerprint to look up
        fingerprint: Fingerprint,
    },

    /// Remove a fingerprint, or one file from it
    Remove {
        /// Fingerprint to remove
        fingerprint: Fingerprint,

        /// Only remove this identity from the fingerprint
        #[arg(short, long)]
        identity: Option<String>,
    },

    /// Show index statistics
    Stats,

    /// Remove every entry from the index
    Clear,

    /// Show current configuration
    ShowConfig,

    /// Generate a configuration file
    GenerateConfig {
        /// Output path for the config file (defaults to standard location)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the active settings (config file plus command-line overrides)
        /// instead of the commented template
        #[arg(long)]
        current: bool,
    },
}
