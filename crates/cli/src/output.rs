// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use std::fmt;
use std::time::Duration;

use fx_core::{JobReport, JobState};
use fx_engine::SweepReport;
use serde::Serialize;

use crate::client::DaemonStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Print output in the specified format
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// A finished job as the user sees it
#[derive(Serialize)]
#[serde(transparent)]
pub struct JobView<'a>(pub &'a JobReport);

impl fmt::Display for JobView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        write!(f, "Job {}: {} ({})", report.id, report.state, report.effect)?;
        for (name, url) in &report.outputs {
            write!(f, "\n  {}: {}", name, url)?;
        }
        if let Some(error) = &report.error {
            write!(f, "\n  error: {}", error.kind)?;
            if let Some(stage) = error.stage {
                write!(f, " at {}", stage)?;
            }
            write!(f, "\n  detail: {}", error.detail)?;
        }
        Ok(())
    }
}

impl JobView<'_> {
    pub fn failed(&self) -> bool {
        self.0.state == JobState::Failed
    }
}

#[derive(Serialize)]
pub struct StatusView {
    pub uptime_secs: u64,
    pub active_jobs: usize,
    pub last_sweep: Option<SweepReport>,
}

impl From<DaemonStatus> for StatusView {
    fn from(status: DaemonStatus) -> Self {
        Self {
            uptime_secs: status.uptime_secs,
            active_jobs: status.active_jobs,
            last_sweep: status.last_sweep,
        }
    }
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let uptime = humantime::format_duration(Duration::from_secs(self.uptime_secs));
        writeln!(f, "Daemon running (up {})", uptime)?;
        writeln!(f, "  active jobs: {}", self.active_jobs)?;
        match &self.last_sweep {
            Some(report) => write!(f, "  last sweep: {}", SweepView(*report)),
            None => write!(f, "  last sweep: none yet"),
        }
    }
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct SweepView(pub SweepReport);

impl fmt::Display for SweepView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.0;
        write!(
            f,
            "examined {}, purged {}, kept {} active and {} recent, {} failed",
            r.examined, r.purged, r.skipped_active, r.skipped_young, r.failures
        )
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
