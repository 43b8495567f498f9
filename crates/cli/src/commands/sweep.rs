// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fx sweep` - Run one retention pass now

use anyhow::Result;

use crate::client::{DaemonClient, DaemonPaths};
use crate::output::{self, OutputFormat, SweepView};

pub async fn handle(paths: &DaemonPaths, format: OutputFormat) -> Result<()> {
    let client = DaemonClient::connect_or_start(paths)?;
    let report = client.sweep().await?;
    output::print(&SweepView(report), format);
    Ok(())
}
