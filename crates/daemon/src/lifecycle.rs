// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use fx_adapters::{ProcessToolAdapter, ToolAdapter, TracedToolAdapter};
use fx_core::{ConfigError, SystemClock, UuidIdGen};
use fx_engine::{EffectPipeline, JobRegistry, RetentionSweeper};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// How long in-flight connections get to finish on shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Service with the real tool adapter (wrapped with tracing)
pub type DaemonService = Service<TracedToolAdapter<ProcessToolAdapter>>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Service config file; defaults apply under the current directory when absent
    pub settings_path: Option<PathBuf>,
}

impl Config {
    /// Derive every daemon path from the state directory
    pub fn resolve(settings_path: Option<PathBuf>) -> Result<Self, LifecycleError> {
        let state_dir = fx_daemon::state_dir().ok_or(LifecycleError::NoStateDir)?;
        let settings_path =
            settings_path.or_else(|| std::env::var_os("FX_CONFIG").map(PathBuf::from));

        Ok(Self {
            socket_path: fx_daemon::socket_path(&state_dir),
            lock_path: state_dir.join(fx_daemon::LOCK_FILE),
            version_path: state_dir.join(fx_daemon::VERSION_FILE),
            log_path: state_dir.join(fx_daemon::LOG_FILE),
            settings_path,
        })
    }

    /// Load the service settings this daemon runs with
    pub fn load_settings(&self) -> Result<fx_core::Config, LifecycleError> {
        match &self.settings_path {
            Some(path) => Ok(fx_core::Config::load(path)?),
            None => {
                let mut settings = fx_core::Config::default();
                settings.resolve_paths(&std::env::current_dir()?);
                Ok(settings)
            }
        }
    }
}

/// Everything a connection handler needs, shared across tasks
pub struct Service<T> {
    pub pipeline: EffectPipeline<T, SystemClock, UuidIdGen>,
    pub sweeper: RetentionSweeper<SystemClock>,
    pub start_time: Instant,
    /// Fires on shutdown; in-flight jobs run under child tokens
    pub shutdown: CancellationToken,
}

impl<T: ToolAdapter> Service<T> {
    pub fn new(settings: &fx_core::Config, tools: T) -> Self {
        let registry = JobRegistry::new();
        Self {
            pipeline: EffectPipeline::new(
                settings,
                registry.clone(),
                tools,
                SystemClock,
                UuidIdGen,
            ),
            sweeper: RetentionSweeper::new(settings, registry, SystemClock),
            start_time: Instant::now(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn request_shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub listener: UnixListener,
    pub service: Arc<DaemonService>,
    /// Connection handlers still running
    pub connections: TaskTracker,
    sweeper_task: Option<JoinHandle<()>>,
}

impl DaemonState {
    /// Shutdown the daemon gracefully
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // 1. Cancel running tools and stop the sweeper
        self.service.shutdown.cancel();
        if let Some(task) = self.sweeper_task.take() {
            if let Err(e) = task.await {
                warn!("Sweeper task ended abnormally: {}", e);
            }
        }

        // 2. Let in-flight connections write their final response
        self.connections.close();
        if tokio::time::timeout(SHUTDOWN_GRACE, self.connections.wait())
            .await
            .is_err()
        {
            warn!(
                remaining = self.connections.len(),
                "Connections still open after grace period"
            );
        }

        // 3. Remove socket, PID and version files
        for path in [
            &self.config.socket_path,
            &self.config.lock_path,
            &self.config.version_path,
        ] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Failed to remove {}: {}", path.display(), e);
                }
            }
        }

        // 4. Lock is released when self.lock_file is dropped

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // A lock held by another daemon means its files are not ours
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Create state directories
    for path in [&config.socket_path, &config.lock_path] {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // 2. Acquire lock file FIRST - prevents races. Opened without truncation
    //    so a losing daemon does not wipe the winner's PID.
    let mut lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    write_pid(&mut lock_file)?;

    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // 3. Load settings BEFORE binding socket (fail fast on invalid config)
    let settings = config.load_settings()?;
    std::fs::create_dir_all(&settings.storage.artifact_root)?;
    std::fs::create_dir_all(&settings.storage.upload_root)?;
    info!(
        artifact_root = %settings.storage.artifact_root.display(),
        upload_root = %settings.storage.upload_root.display(),
        backend = ?settings.separate.backend,
        "Loaded settings"
    );

    // 4. Build the service around the real tool adapter
    let tools = TracedToolAdapter::new(ProcessToolAdapter::new(settings.invoker.tail_bytes));
    let service = Arc::new(Service::new(&settings, tools));

    // 5. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    // 6. Periodic retention
    let sweeper_task = service
        .sweeper
        .clone()
        .spawn(settings.retention.interval, service.shutdown.child_token());

    info!(
        interval = ?settings.retention.interval,
        min_age = ?settings.retention.min_age,
        "Retention sweeper started"
    );

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        service,
        connections: TaskTracker::new(),
        sweeper_task: Some(sweeper_task),
    })
}

fn write_pid(lock_file: &mut File) -> std::io::Result<()> {
    use std::io::Write;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    lock_file.flush()
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    for path in [
        &config.socket_path,
        &config.version_path,
        &config.lock_path,
    ] {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
