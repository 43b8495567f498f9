// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake tool adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ToolAdapter, ToolError, ToolInvocation, ToolOutput};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Recorded tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
}

type Handler = Arc<dyn Fn(&ToolInvocation) -> Result<ToolOutput, ToolError> + Send + Sync>;

#[derive(Default)]
struct FakeState {
    calls: Vec<ToolCall>,
    handlers: HashMap<String, Handler>,
    delay: Option<Duration>,
}

/// Fake tool adapter for testing
///
/// Programs without a handler succeed with empty output. Handlers run after
/// the optional delay, so they can create the files a real tool would.
#[derive(Clone, Default)]
pub struct FakeToolAdapter {
    state: Arc<Mutex<FakeState>>,
}

impl FakeToolAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a handler for `program`
    pub fn on<F>(&self, program: &str, handler: F)
    where
        F: Fn(&ToolInvocation) -> Result<ToolOutput, ToolError> + Send + Sync + 'static,
    {
        self.lock()
            .handlers
            .insert(program.to_string(), Arc::new(handler));
    }

    /// Make every run of `program` fail with `error`
    pub fn fail_with(&self, program: &str, error: ToolError) {
        self.on(program, move |_| Err(error.clone()));
    }

    /// Hold each run for `delay` before the handler fires
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ToolCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Programs in call order
    pub fn programs(&self) -> Vec<String> {
        self.lock().calls.iter().map(|c| c.program.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ToolAdapter for FakeToolAdapter {
    async fn run(
        &self,
        invocation: &ToolInvocation,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, ToolError> {
        let program = invocation.program.clone();
        if cancel.is_cancelled() {
            return Err(ToolError::Cancelled { program });
        }

        let (delay, handler) = {
            let mut state = self.lock();
            state.calls.push(ToolCall {
                program: program.clone(),
                args: invocation.args_lossy(),
                cwd: invocation.cwd.clone(),
                env: invocation.env.clone(),
                timeout: invocation.timeout,
            });
            (state.delay, state.handlers.get(&program).cloned())
        };

        if let Some(delay) = delay {
            tokio::select! {
                _ = tokio::time::sleep(delay.min(invocation.timeout)) => {
                    if delay > invocation.timeout {
                        return Err(ToolError::Timeout {
                            program,
                            timeout: invocation.timeout,
                            stderr_tail: String::new(),
                        });
                    }
                }
                _ = cancel.cancelled() => return Err(ToolError::Cancelled { program }),
            }
        }

        match handler {
            Some(handler) => handler(invocation),
            None => Ok(ToolOutput::default()),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
