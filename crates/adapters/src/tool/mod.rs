// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External tool invocation
//!
//! A tool is a program plus a discrete argument vector. Nothing here goes
//! through a shell, so user-supplied values (URLs, paths) can never be
//! reinterpreted as syntax.

mod capture;
mod process;

pub use capture::StreamCapture;
pub use process::ProcessToolAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeToolAdapter, ToolCall};

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Known failure signatures a tool can print
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// The source needs a signed-in session (expired or missing cookies)
    AuthRequired,
}

/// Substring to watch for in a tool's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureMarker {
    pub pattern: String,
    pub kind: MarkerKind,
}

impl FailureMarker {
    pub fn new(pattern: impl Into<String>, kind: MarkerKind) -> Self {
        Self {
            pattern: pattern.into(),
            kind,
        }
    }
}

/// One run of an external program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
    pub markers: Vec<FailureMarker>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: Vec::new(),
            timeout,
            markers: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn marker(mut self, marker: FailureMarker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Arguments as display strings, for logs and test assertions
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

/// Result of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub exit_code: i32,
    pub stdout_tail: String,
    pub stderr_tail: String,
}

/// Coarse classification of a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    Timeout,
    NonZeroExit,
    SpawnFailure,
    Cancelled,
}

/// A run that did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("{program} timed out after {timeout:?}")]
    Timeout {
        program: String,
        timeout: Duration,
        stderr_tail: String,
    },
    #[error("{program} exited with {}", exit_label(*.code))]
    NonZeroExit {
        program: String,
        /// None when the process was killed by a signal
        code: Option<i32>,
        stdout_tail: String,
        stderr_tail: String,
        marker: Option<MarkerKind>,
    },
    #[error("failed to start {program}: {detail}")]
    SpawnFailure { program: String, detail: String },
    #[error("{program} was cancelled")]
    Cancelled { program: String },
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "a signal".to_string(),
    }
}

impl ToolError {
    pub fn kind(&self) -> ToolErrorKind {
        match self {
            ToolError::Timeout { .. } => ToolErrorKind::Timeout,
            ToolError::NonZeroExit { .. } => ToolErrorKind::NonZeroExit,
            ToolError::SpawnFailure { .. } => ToolErrorKind::SpawnFailure,
            ToolError::Cancelled { .. } => ToolErrorKind::Cancelled,
        }
    }

    /// Known failure signature seen in the output, if any
    pub fn marker(&self) -> Option<MarkerKind> {
        match self {
            ToolError::NonZeroExit { marker, .. } => *marker,
            _ => None,
        }
    }

    pub fn program(&self) -> &str {
        match self {
            ToolError::Timeout { program, .. }
            | ToolError::NonZeroExit { program, .. }
            | ToolError::SpawnFailure { program, .. }
            | ToolError::Cancelled { program } => program,
        }
    }

    pub fn stderr_tail(&self) -> &str {
        match self {
            ToolError::Timeout { stderr_tail, .. } | ToolError::NonZeroExit { stderr_tail, .. } => {
                stderr_tail
            }
            ToolError::SpawnFailure { .. } | ToolError::Cancelled { .. } => "",
        }
    }
}

/// Runs external programs
///
/// Implementations must enforce `invocation.timeout`, stop the process when
/// `cancel` fires, and keep only bounded tails of the program's output.
#[async_trait]
pub trait ToolAdapter: Clone + Send + Sync + 'static {
    async fn run(
        &self,
        invocation: &ToolInvocation,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, ToolError>;
}
