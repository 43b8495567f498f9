// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::tool::{ToolAdapter, ToolError, ToolInvocation, ToolOutput};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Wrapper that adds tracing to any ToolAdapter
#[derive(Clone)]
pub struct TracedToolAdapter<T> {
    inner: T,
}

impl<T> TracedToolAdapter<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: ToolAdapter> ToolAdapter for TracedToolAdapter<T> {
    async fn run(
        &self,
        invocation: &ToolInvocation,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, ToolError> {
        let span = tracing::info_span!(
            "tool.run",
            program = %invocation.program,
            cwd = %invocation.cwd.display(),
        );

        async {
            tracing::info!(
                args = ?invocation.args_lossy(),
                env_count = invocation.env.len(),
                timeout_ms = invocation.timeout.as_millis() as u64,
                "starting"
            );

            // Precondition: cwd must exist
            if !invocation.cwd.is_dir() {
                tracing::error!("working directory does not exist");
                return Err(ToolError::SpawnFailure {
                    program: invocation.program.clone(),
                    detail: format!(
                        "working directory does not exist: {}",
                        invocation.cwd.display()
                    ),
                });
            }

            let start = std::time::Instant::now();
            let result = self.inner.run(invocation, cancel).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(output) => tracing::info!(
                    elapsed_ms,
                    stderr_len = output.stderr_tail.len(),
                    "tool finished"
                ),
                Err(ToolError::Cancelled { .. }) => {
                    tracing::info!(elapsed_ms, "tool cancelled")
                }
                Err(e) => tracing::warn!(
                    elapsed_ms,
                    error = %e,
                    marker = ?e.marker(),
                    stderr_tail = e.stderr_tail(),
                    "tool failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
