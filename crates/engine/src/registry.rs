// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-flight job registry
//!
//! The sweeper treats this as the authority on which artifacts are in use.
//! An id is held either by a running job or, briefly, by the sweeper while
//! it deletes that id's artifacts; the two exclude each other.

use crate::error::RegistryError;
use fx_core::JobId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Holder {
    Job,
    Purge,
}

/// Concurrent set of active job ids
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    held: Arc<Mutex<HashMap<JobId, Holder>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` active until the returned guard is dropped
    pub fn register(&self, id: &JobId) -> Result<Registration, RegistryError> {
        let mut held = self.lock();
        match held.get(id) {
            Some(Holder::Job) => return Err(RegistryError::Occupied(id.clone())),
            Some(Holder::Purge) => return Err(RegistryError::Purging(id.clone())),
            None => {}
        }
        held.insert(id.clone(), Holder::Job);
        tracing::debug!(job_id = %id, "registered");
        Ok(Registration {
            registry: self.clone(),
            id: id.clone(),
        })
    }

    /// Release `id`; returns whether it was registered
    pub fn unregister(&self, id: &JobId) -> bool {
        let mut held = self.lock();
        if held.get(id) == Some(&Holder::Job) {
            held.remove(id);
            tracing::debug!(job_id = %id, "unregistered");
            true
        } else {
            false
        }
    }

    pub fn is_active(&self, id: &JobId) -> bool {
        self.lock().get(id) == Some(&Holder::Job)
    }

    pub fn active_count(&self) -> usize {
        self.lock().values().filter(|h| **h == Holder::Job).count()
    }

    /// Take `id` for deletion, or None if a job holds it
    ///
    /// While the lease lives, `register` for the same id fails.
    pub fn lease_for_purge(&self, id: &JobId) -> Option<PurgeLease> {
        let mut held = self.lock();
        if held.contains_key(id) {
            return None;
        }
        held.insert(id.clone(), Holder::Purge);
        Some(PurgeLease {
            registry: self.clone(),
            id: id.clone(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, Holder>> {
        self.held.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Keeps a job id registered; unregisters on drop
#[derive(Debug)]
pub struct Registration {
    registry: JobRegistry,
    id: JobId,
}

impl Registration {
    pub fn id(&self) -> &JobId {
        &self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(&self.id);
    }
}

/// Exclusive claim on an id while its artifacts are deleted
#[derive(Debug)]
pub struct PurgeLease {
    registry: JobRegistry,
    id: JobId,
}

impl Drop for PurgeLease {
    fn drop(&mut self) {
        let mut held = self.registry.lock();
        if held.get(&self.id) == Some(&Holder::Purge) {
            held.remove(&self.id);
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
