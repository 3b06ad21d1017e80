//! LabelPack CLI (packctl)
//!
//! Command-line tool for building and inspecting LabelPack containers.
//!
//! ## Overview
//!
//! `packctl` provides three operations:
//! - **pack**: Build a container from a list of `<label> <path> [extra]` lines
//! - **info**: Print segment and label statistics of a container
//! - **sample**: Stream records out of a container with a sampling config
//!
//! ## Quick Start
//!
//! ```bash
//! # Pack a dataset
//! packctl pack train.pack --list train.txt
//!
//! # Inspect it
//! packctl info train.pack
//!
//! # Preview the evaluation split of fold 1 in 5-fold cross validation
//! packctl sample train.pack --kfold 5 --fold 1 --eval
//! ```
//!
//! ## Configuration
//!
//! - `RUST_LOG`: Log level for stderr output (default: info)
//! - `--config`: TOML file with a `StreamConfig` for `sample`

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

#[derive(Parser)]
#[command(name = "packctl")]
#[command(about = "LabelPack container tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack labeled files into a new container
    Pack {
        /// Output container path (must not exist)
        output: PathBuf,

        /// List file with one `<label> <path> [extra...]` entry per line
        #[arg(short, long)]
        list: PathBuf,

        /// Log and skip entries whose file cannot be read
        #[arg(long)]
        skip_bad: bool,
    },
    /// Show segments, records and label histogram of a container
    Info {
        /// Container path
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Stream samples out of a container
    Sample(commands::sample::SampleArgs),
}

fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .parse()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Pack {
            output,
            list,
            skip_bad,
        } => commands::pack::handle_pack(&output, &list, skip_bad),
        Commands::Info { file, json } => commands::info::handle_info(&file, json),
        Commands::Sample(args) => commands::sample::handle_sample(args),
    }
}
