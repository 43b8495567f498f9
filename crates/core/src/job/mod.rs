// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job state machine

mod effect;
mod source;
mod state;

pub use effect::Effect;
pub use source::{Source, SourceSpec};
pub use state::JobState;

use crate::clock::Clock;
use crate::error::JobError;
use crate::id::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Rejected state change
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job {id}: invalid transition {from} -> {to}")]
pub struct TransitionError {
    pub id: JobId,
    pub from: JobState,
    pub to: JobState,
}

/// One processing request, from source acquisition to published outputs
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub source: Source,
    pub effect: Effect,
    pub state: JobState,
    /// Absolute path of the job's exclusive directory, set at fetch entry
    pub working_dir: Option<PathBuf>,
    /// Logical output name -> path relative to the public serving root
    pub outputs: BTreeMap<String, PathBuf>,
    pub error: Option<JobError>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl Job {
    pub fn new(id: JobId, source: Source, effect: Effect, clock: &impl Clock) -> Self {
        let now = clock.now();
        Self {
            id,
            source,
            effect,
            state: JobState::Created,
            working_dir: None,
            outputs: BTreeMap::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next`, rejecting backward moves and anything after a terminal state
    pub fn advance(&mut self, next: JobState, clock: &impl Clock) -> Result<(), TransitionError> {
        if !self.state.can_advance_to(next) {
            return Err(TransitionError {
                id: self.id.clone(),
                from: self.state,
                to: next,
            });
        }
        tracing::info!(job_id = %self.id, from = %self.state, to = %next, "job transition");
        self.state = next;
        self.updated_at = clock.now();
        Ok(())
    }

    /// Terminate the job with `error`
    pub fn fail(&mut self, error: JobError, clock: &impl Clock) -> Result<(), TransitionError> {
        self.advance(JobState::Failed, clock)?;
        tracing::warn!(job_id = %self.id, kind = %error.kind, stage = ?error.stage, "job failed");
        self.error = Some(error);
        Ok(())
    }

    /// Record verified outputs and make the job servable
    ///
    /// Only valid from Verifying; outputs are written in the same step as
    /// the transition so a Published job always carries them.
    pub fn publish(
        &mut self,
        outputs: BTreeMap<String, PathBuf>,
        clock: &impl Clock,
    ) -> Result<(), TransitionError> {
        if self.state != JobState::Verifying {
            return Err(TransitionError {
                id: self.id.clone(),
                from: self.state,
                to: JobState::Published,
            });
        }
        self.advance(JobState::Published, clock)?;
        self.outputs = outputs;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Caller-facing view of a job
///
/// Carries only public URLs, never filesystem paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    pub id: JobId,
    pub state: JobState,
    pub effect: Effect,
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobReport {
    /// Build a report, joining each relative output onto `public_prefix`
    pub fn from_job(job: &Job, public_prefix: &str) -> Self {
        let outputs = job
            .outputs
            .iter()
            .map(|(name, rel)| (name.clone(), public_url(public_prefix, rel)))
            .collect();
        Self {
            id: job.id.clone(),
            state: job.state,
            effect: job.effect,
            outputs,
            error: job.error.clone(),
            created_at: job.created_at.into(),
            updated_at: job.updated_at.into(),
        }
    }

    /// Report for a submission turned away before a job could be built
    pub fn rejected(id: JobId, effect: Effect, error: JobError, at: SystemTime) -> Self {
        Self {
            id,
            state: JobState::Failed,
            effect,
            outputs: BTreeMap::new(),
            error: Some(error),
            created_at: at.into(),
            updated_at: at.into(),
        }
    }
}

fn public_url(prefix: &str, rel: &Path) -> String {
    let mut url = prefix.trim_end_matches('/').to_string();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            url.push('/');
            url.push_str(&part.to_string_lossy());
        }
    }
    url
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
