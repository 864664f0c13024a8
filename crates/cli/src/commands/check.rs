// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rill check <changelog>` - Validate a changelog file

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use rill_storage::{ChangelogReader, ChangelogValidation};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Args)]
pub struct CheckArgs {
    /// Changelog file (JSON lines)
    pub changelog: PathBuf,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(Serialize)]
struct Report {
    path: String,
    #[serde(flatten)]
    validation: ChangelogValidation,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Changelog: {}", self.path)?;
        writeln!(f, "  Entries: {}", self.validation.valid_entries)?;
        match self.validation.last_valid_sequence {
            Some(sequence) => write!(f, "  Last sequence: {}", sequence)?,
            None => write!(f, "  Last sequence: -")?,
        }
        if let Some(corruption) = &self.validation.corruption {
            write!(
                f,
                "\n  Corrupt at line {}: {}",
                corruption.line, corruption.reason
            )?;
        }
        Ok(())
    }
}

/// Print the report; a corrupt file is an error after printing
pub fn check(args: CheckArgs) -> Result<()> {
    let validation = ChangelogReader::open(&args.changelog)
        .and_then(|reader| reader.validate())
        .with_context(|| format!("cannot read changelog {}", args.changelog.display()))?;

    let report = Report {
        path: args.changelog.display().to_string(),
        validation,
    };
    output::print(&report, args.output)?;

    if let Some(corruption) = &report.validation.corruption {
        anyhow::bail!(
            "changelog is corrupt from line {}; later entries are ignored on replay",
            corruption.line
        );
    }
    Ok(())
}
