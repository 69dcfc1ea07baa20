// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Voxio CLI
//!
//! Command-line tool for the dataset format registry.
//!
//! ## Usage
//!
//! ```sh
//! # List registered formats in search order
//! voxio formats
//!
//! # Show what a dataset holds
//! voxio inspect cells.zarr
//!
//! # Copy a dataset into another format
//! voxio convert cells.zarr out/cells.stack --create-parents
//!
//! # Use a registry configuration
//! voxio --config voxio.toml formats
//! ```

mod cmd;
mod common;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use cmd::{ConvertCmd, FormatsCmd, InspectCmd};
use common::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Voxio - dataset format toolkit
///
/// Read, inspect and convert multi-dimensional datasets through a registry
/// of pluggable formats.
#[derive(Parser, Clone)]
#[command(name = "voxio")]
#[command(about = "Dataset format registry toolkit", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Registry configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// List registered formats in search order
    Formats(FormatsCmd),

    /// Show format, index space and metadata of a dataset
    Inspect(InspectCmd),

    /// Copy every unit and the metadata of a dataset to a new location
    Convert(ConvertCmd),
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "voxio=warn",
        1 => "voxio=debug",
        _ => "voxio=trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = Context::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Formats(cmd) => cmd.run(&ctx),
        Commands::Inspect(cmd) => cmd.run(&ctx),
        Commands::Convert(cmd) => cmd.run(&ctx),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
