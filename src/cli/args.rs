//! CLI argument definitions using clap
//!
//! Commands:
//! - cloudstore upload <local> [--location <dir>] [--bucket <name>]
//! - cloudstore download <remote> <dest> [--bucket <name>]
//! - cloudstore metadata <remote> [--bucket <name>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cloudstore - upload, download and inspect files on any configured backend
#[derive(Parser, Debug)]
#[command(name = "cloudstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./cloudstore.json")]
    pub config: PathBuf,

    /// Log filter directives, overriding `RUST_LOG` and `log_filter`
    #[arg(long, global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a local file
    Upload {
        /// File to upload
        local_path: PathBuf,

        /// Remote directory the file is placed under
        #[arg(long, default_value = "")]
        location: String,

        /// Target bucket (defaults to `default_bucket` from the config)
        #[arg(long)]
        bucket: Option<String>,
    },

    /// Download a stored file into a local file
    Download {
        /// Remote path of the object
        remote_path: String,

        /// Local file to write
        destination: PathBuf,

        #[arg(long)]
        bucket: Option<String>,
    },

    /// Print the metadata of a stored file
    Metadata {
        /// Remote path of the object
        remote_path: String,

        #[arg(long)]
        bucket: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
