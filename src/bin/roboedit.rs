// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Roboedit CLI
//!
//! Bulk editing of MCAP files.
//!
//! ## Usage
//!
//! ```sh
//! # Delete a topic and rename another across a directory of recordings
//! roboedit edit -i recordings/ -o edited/ -d /camera/raw -r /imu=/imu/data
//!
//! # Keep a time window and recompress with lz4
//! roboedit edit -i run.mcap -o out/ -s 2024-05-01T10:00:00Z -e 2024-05-01T10:05:00Z -c lz4
//!
//! # Apply a TOML edit plan, overriding the worker count
//! roboedit edit -i recordings/ -o edited/ --config plan.toml -j 4
//!
//! # Show file details
//! roboedit info run.mcap
//! ```

mod cmd;
mod common;

use std::process;

use clap::{ArgAction, Parser, Subcommand};
use cmd::{EditCmd, InfoCmd};
use common::Result;
use tracing_subscriber::EnvFilter;

/// Roboedit - bulk MCAP editor
///
/// Delete, rename, trim, time-shift and recompress topics in many MCAP
/// files at once. Every input is written to a new file in the output
/// directory; inputs are never modified.
#[derive(Parser, Clone)]
#[command(name = "roboedit")]
#[command(about = "Bulk editor for MCAP robotics log files", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Edit MCAP files into an output directory
    Edit(EditCmd),

    /// Show header, summary and topic details of an MCAP file
    Info(InfoCmd),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Edit(cmd) => cmd.run(),
        Commands::Info(cmd) => cmd.run(),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
