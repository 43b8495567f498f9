// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use fx_core::{JobError, JobId};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the artifact store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("name escapes its directory: {0}")]
    Traversal(String),
    #[error("path is outside the artifact root: {0}")]
    OutsideRoot(PathBuf),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<StoreError> for JobError {
    /// Paths stay in the logs; callers only learn the store failed
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "artifact store failure");
        match err {
            StoreError::Io { .. } => JobError::storage("artifact storage is unavailable"),
            StoreError::Traversal(_) | StoreError::OutsideRoot(_) => {
                JobError::internal("artifact path rejected")
            }
        }
    }
}

/// Errors from the job registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("job id already registered: {0}")]
    Occupied(JobId),
    #[error("job id is being purged: {0}")]
    Purging(JobId),
}
