// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fx submit (--url URL | --file PATH) [--effect E]` - Run one job

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{ArgGroup, Args};
use fx_core::SourceSpec;

use crate::client::{DaemonClient, DaemonPaths};
use crate::output::{self, JobView, OutputFormat};

#[derive(Args)]
#[command(group(ArgGroup::new("source").required(true).args(["url", "file"])))]
pub struct SubmitArgs {
    /// Media page URL to fetch audio from
    #[arg(long)]
    pub url: Option<String>,

    /// Previously uploaded file (must live under the upload root)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Effect to apply: none, time-stretch-reverb, vocal-isolate
    #[arg(long, short, default_value = "none")]
    pub effect: String,
}

impl SubmitArgs {
    /// The daemon resolves uploads on its own filesystem view, so send absolute paths
    pub fn source(&self, cwd: &Path) -> SourceSpec {
        SourceSpec {
            url: self.url.clone(),
            upload: self.file.as_ref().map(|file| cwd.join(file)),
        }
    }
}

pub async fn handle(args: SubmitArgs, paths: &DaemonPaths, format: OutputFormat) -> Result<()> {
    let source = args.source(&std::env::current_dir()?);
    let client = DaemonClient::connect_or_start(paths)?;

    let report = client.submit(source, &args.effect).await?;
    let view = JobView(&report);
    output::print(&view, format);

    if view.failed() {
        let kind = report
            .error
            .as_ref()
            .map_or("internal_error", |e| e.kind.token());
        anyhow::bail!("job {} failed ({})", report.id, kind);
    }
    Ok(())
}

#[cfg(test)]
#[path = "submit_tests.rs"]
mod tests;
