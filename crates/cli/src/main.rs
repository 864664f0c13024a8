// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rill - inspect Rill changelogs and windows

mod commands;
mod config;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, replay, windows};
use config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rill",
    version,
    about = "Rill - inspect table changelogs and stream windows"
)]
struct Cli {
    /// Config file (defaults to ./rill.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild a table from its changelog and print it
    Replay(replay::ReplayArgs),
    /// Validate a changelog file
    Check(check::CheckArgs),
    /// Show the window buckets containing a timestamp
    Windows(windows::WindowsArgs),
    /// Print the effective configuration
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::setup_logging(cli.log_file.as_deref())?;

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Replay(args) => replay::replay(args, &config),
        Commands::Check(args) => check::check(args),
        Commands::Windows(args) => windows::windows(args, &config),
        Commands::Config(args) => commands::config::show(args, &config),
    }
}
