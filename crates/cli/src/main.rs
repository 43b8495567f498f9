// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fx - audio effect jobs CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{daemon, submit, sweep};

use crate::client::DaemonPaths;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "fx",
    version,
    about = "fx - fetch audio and apply effects through the fxd daemon"
)]
struct Cli {
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a job and wait for its report
    Submit(submit::SubmitArgs),
    /// Show daemon status
    Status,
    /// Run one retention pass now
    Sweep,
    /// Check that the daemon answers
    Ping,
    /// Stop the daemon
    Shutdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    let cli = Cli::parse();
    let format = OutputFormat::from_json_flag(cli.json);
    let paths = DaemonPaths::resolve()?;

    match cli.command {
        Commands::Submit(args) => submit::handle(args, &paths, format).await,
        Commands::Status => daemon::status(&paths, format).await,
        Commands::Sweep => sweep::handle(&paths, format).await,
        Commands::Ping => daemon::ping(&paths).await,
        Commands::Shutdown => daemon::shutdown(&paths).await,
    }
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
