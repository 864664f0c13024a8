// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rill config` - Print the effective configuration

use crate::config::Config;
use crate::output::OutputFormat;
use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

pub fn show(args: ConfigArgs, config: &Config) -> Result<()> {
    match args.output {
        OutputFormat::Text => print!("{}", toml::to_string(config)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}
