// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a job is in its pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Created,
    Fetching,
    Fetched,
    Transforming,
    Verifying,
    Published,
    Failed,
}

impl JobState {
    /// Published and Failed absorb every further transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Published | JobState::Failed)
    }

    /// Whether the pipeline may move from `self` to `next`
    ///
    /// Transform is skipped for effect-less jobs, so Fetched may go straight
    /// to Verifying. Any non-terminal state may fail.
    pub fn can_advance_to(&self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Published | Failed, _) => false,
            (_, Failed) => true,
            (Created, Fetching)
            | (Fetching, Fetched)
            | (Fetched, Transforming)
            | (Fetched, Verifying)
            | (Transforming, Verifying)
            | (Verifying, Published) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Created => "created",
            JobState::Fetching => "fetching",
            JobState::Fetched => "fetched",
            JobState::Transforming => "transforming",
            JobState::Verifying => "verifying",
            JobState::Published => "published",
            JobState::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
