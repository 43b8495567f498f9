// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention sweeper
//!
//! Deletes old artifacts from the artifact and upload roots. Entries owned
//! by a registered job are never touched. Shared model directories are
//! kept; their per-job children are swept like top-level entries.

use crate::registry::JobRegistry;
use crate::store::{ArtifactStore, Entry};
use crate::tools::SeparationLayout;
use fx_core::{Clock, Config, JobId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Counts from one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub examined: usize,
    pub purged: usize,
    pub skipped_active: usize,
    pub skipped_young: usize,
    pub failures: usize,
}

#[derive(Clone)]
pub struct RetentionSweeper<C> {
    stores: Vec<ArtifactStore>,
    registry: JobRegistry,
    min_age: Duration,
    protected: BTreeSet<String>,
    clock: C,
    last: Arc<Mutex<Option<SweepReport>>>,
}

impl<C: Clock> RetentionSweeper<C> {
    pub fn new(config: &Config, registry: JobRegistry, clock: C) -> Self {
        let protected = SeparationLayout::all_model_dirs()
            .into_iter()
            .map(str::to_string)
            .chain(config.retention.protected.iter().cloned())
            .collect();
        Self {
            stores: vec![
                ArtifactStore::new(&config.storage.artifact_root),
                ArtifactStore::new(&config.storage.upload_root),
            ],
            registry,
            min_age: config.retention.min_age,
            protected,
            clock,
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Report of the most recent completed pass
    pub fn last_report(&self) -> Option<SweepReport> {
        *self.last.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// One full pass over every root
    ///
    /// A failing entry is logged and counted; the pass always continues.
    pub fn run_once(&self) -> SweepReport {
        let mut report = SweepReport::default();

        for store in &self.stores {
            let entries = match store.entries() {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(root = %store.root().display(), error = %e, "cannot list root");
                    report.failures += 1;
                    continue;
                }
            };

            for entry in entries {
                if !self.protected.contains(&entry.name) {
                    self.consider(store, &entry, &mut report);
                    continue;
                }
                if !entry.is_dir {
                    continue;
                }
                match store.shared_entries(&entry.name) {
                    Ok(children) => {
                        for child in children {
                            self.consider(store, &child, &mut report);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(dir = %entry.name, error = %e, "cannot list shared dir");
                        report.failures += 1;
                    }
                }
            }
        }

        tracing::info!(
            examined = report.examined,
            purged = report.purged,
            skipped_active = report.skipped_active,
            skipped_young = report.skipped_young,
            failures = report.failures,
            "sweep complete"
        );
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(report);
        report
    }

    fn consider(&self, store: &ArtifactStore, entry: &Entry, report: &mut SweepReport) {
        report.examined += 1;

        let owner = JobId::from_artifact_name(&entry.name);
        if owner.as_ref().is_some_and(|id| self.registry.is_active(id)) {
            tracing::debug!(entry = %entry.name, "owned by active job");
            report.skipped_active += 1;
            return;
        }

        // Future mtimes count as fresh
        let age = self
            .clock
            .now()
            .duration_since(entry.modified)
            .unwrap_or_default();
        if age < self.min_age {
            report.skipped_young += 1;
            return;
        }

        // Holding the lease keeps the id from being registered mid-delete
        let _lease = match &owner {
            Some(id) => match self.registry.lease_for_purge(id) {
                Some(lease) => Some(lease),
                None => {
                    report.skipped_active += 1;
                    return;
                }
            },
            None => None,
        };

        match store.purge(&entry.path) {
            Ok(()) => {
                tracing::info!(path = %entry.path.display(), age_secs = age.as_secs(), "purged");
                report.purged += 1;
            }
            Err(e) => {
                tracing::warn!(path = %entry.path.display(), error = %e, "purge failed");
                report.failures += 1;
            }
        }
    }

    /// Sweep every `interval` until `shutdown` fires
    pub fn spawn(self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let sweeper = self.clone();
                        let pass = tokio::task::spawn_blocking(move || sweeper.run_once());
                        if let Err(e) = pass.await {
                            tracing::error!(error = %e, "sweep task failed");
                        }
                    }
                }
            }
            tracing::debug!("sweeper stopped");
        })
    }
}

#[cfg(test)]
#[path = "sweeper_tests.rs"]
mod tests;
