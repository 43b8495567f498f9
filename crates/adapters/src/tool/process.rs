// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-process tool adapter

use super::{StreamCapture, ToolAdapter, ToolError, ToolInvocation, ToolOutput};
use async_trait::async_trait;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long to wait for output pipes to close once the process is gone
const DRAIN_GRACE: Duration = Duration::from_secs(2);

type SharedCapture = Arc<Mutex<StreamCapture>>;

enum Outcome {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Runs tools as child processes in their own process group
///
/// The group is killed as a whole on timeout or cancellation, so helpers a
/// tool forks (ffmpeg under yt-dlp, python workers under spleeter) go too.
#[derive(Debug, Clone)]
pub struct ProcessToolAdapter {
    tail_bytes: usize,
}

impl ProcessToolAdapter {
    pub fn new(tail_bytes: usize) -> Self {
        Self { tail_bytes }
    }
}

impl Default for ProcessToolAdapter {
    fn default() -> Self {
        Self::new(8 * 1024)
    }
}

#[async_trait]
impl ToolAdapter for ProcessToolAdapter {
    async fn run(
        &self,
        invocation: &ToolInvocation,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, ToolError> {
        let program = invocation.program.clone();
        if cancel.is_cancelled() {
            return Err(ToolError::Cancelled { program });
        }

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .process_group(0);

        let mut child = command.spawn().map_err(|e| ToolError::SpawnFailure {
            program: program.clone(),
            detail: e.to_string(),
        })?;
        let pid = child.id();
        tracing::debug!(program, pid, "spawned");

        let stdout = new_capture(self.tail_bytes, invocation);
        let stderr = new_capture(self.tail_bytes, invocation);
        let mut drains = [
            drain(child.stdout.take(), Arc::clone(&stdout)),
            drain(child.stderr.take(), Arc::clone(&stderr)),
        ];

        let outcome = tokio::select! {
            status = child.wait() => Outcome::Exited(status),
            _ = tokio::time::sleep(invocation.timeout) => Outcome::TimedOut,
            _ = cancel.cancelled() => Outcome::Cancelled,
        };

        if !matches!(outcome, Outcome::Exited(_)) {
            kill_group(pid);
            if let Err(e) = child.kill().await {
                tracing::debug!(program, error = %e, "kill after stop");
            }
        }

        // Grandchildren can hold the pipes open after the direct child exits
        let drained = tokio::time::timeout(DRAIN_GRACE, async {
            for task in drains.iter_mut() {
                let _ = task.await;
            }
        })
        .await
        .is_ok();
        if !drained {
            tracing::warn!(program, "output pipes still open after exit, killing group");
            kill_group(pid);
            for task in &drains {
                task.abort();
            }
        }

        let (stdout_tail, stdout_marker) = finish(&stdout);
        let (stderr_tail, stderr_marker) = finish(&stderr);

        match outcome {
            Outcome::Exited(Ok(status)) if status.success() => Ok(ToolOutput {
                exit_code: 0,
                stdout_tail,
                stderr_tail,
            }),
            Outcome::Exited(Ok(status)) => Err(ToolError::NonZeroExit {
                program,
                code: status.code(),
                stdout_tail,
                stderr_tail,
                marker: stderr_marker.or(stdout_marker),
            }),
            Outcome::Exited(Err(e)) => Err(ToolError::SpawnFailure {
                program,
                detail: format!("wait failed: {}", e),
            }),
            Outcome::TimedOut => Err(ToolError::Timeout {
                program,
                timeout: invocation.timeout,
                stderr_tail,
            }),
            Outcome::Cancelled => Err(ToolError::Cancelled { program }),
        }
    }
}

fn new_capture(tail_bytes: usize, invocation: &ToolInvocation) -> SharedCapture {
    Arc::new(Mutex::new(StreamCapture::new(
        tail_bytes,
        invocation.markers.clone(),
    )))
}

fn drain<R>(reader: Option<R>, capture: SharedCapture) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(mut reader) = reader else {
            return;
        };
        let mut buf = vec![0u8; 8 * 1024];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => capture
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .feed(&buf[..n]),
            }
        }
    })
}

fn finish(capture: &SharedCapture) -> (String, Option<super::MarkerKind>) {
    let capture = capture.lock().unwrap_or_else(|e| e.into_inner());
    (capture.tail(), capture.marker())
}

fn kill_group(pid: Option<u32>) {
    let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return;
    };
    // ESRCH just means the group is already gone
    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        tracing::trace!(pid, error = %e, "killpg");
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
