// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job error taxonomy
//!
//! Callers see an [`ErrorKind`] token plus a detail sentence. Tool output,
//! argv and filesystem paths stay in the logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed set of failure kinds a job can end with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or missing input; no external process was started
    Validation,
    /// The fetch tool failed
    Fetch,
    /// The fetch tool reported that the source needs a signed-in session
    FetchAuthRequired,
    /// A tool ran past its timeout and was killed
    ToolTimeout,
    /// A tool exited unsuccessfully outside the fetch/transform mapping
    ToolNonZeroExit,
    /// A tool could not be started
    ToolSpawnFailure,
    /// A tool invocation was cancelled from outside
    ToolCancelled,
    /// The transform tool failed
    Transform,
    /// A tool reported success but an expected output is absent or empty
    Verification,
    /// The artifact store is unavailable
    Storage,
    /// Anything unanticipated
    Internal,
}

impl ErrorKind {
    /// Stable token exposed to callers
    pub fn token(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Fetch => "fetch_error",
            ErrorKind::FetchAuthRequired => "fetch_error.auth_required",
            ErrorKind::ToolTimeout => "tool_error.timeout",
            ErrorKind::ToolNonZeroExit => "tool_error.non_zero_exit",
            ErrorKind::ToolSpawnFailure => "tool_error.spawn_failure",
            ErrorKind::ToolCancelled => "tool_error.cancelled",
            ErrorKind::Transform => "transform_error",
            ErrorKind::Verification => "verification_error",
            ErrorKind::Storage => "storage_error",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Pipeline stage a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validate,
    Fetch,
    Transform,
    Verify,
    Publish,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Fetch => "fetch",
            Stage::Transform => "transform",
            Stage::Verify => "verify",
            Stage::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure recorded on a job
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {detail}")]
pub struct JobError {
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    pub detail: String,
}

impl JobError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            stage: None,
            detail: detail.into(),
        }
    }

    pub fn at(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, detail).at(Stage::Validate)
    }

    pub fn storage(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, detail)
    }

    pub fn verification(stage: Stage, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Verification, detail).at(stage)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, detail)
    }
}
