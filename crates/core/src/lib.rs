// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fx-core: data model for audio effect jobs
//!
//! This crate provides:
//! - The job state machine (`Job`, `JobState`) and its caller-facing report
//! - The closed effect set and source validation
//! - The error taxonomy shared by every stage
//! - Explicit configuration, clock and id abstractions

pub mod clock;
pub mod config;
pub mod error;
pub mod id;
pub mod job;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    Config, ConfigError, FetchConfig, InvokerConfig, RetentionConfig, SeparateConfig,
    SeparatorBackend, StorageConfig, TranscodeConfig,
};
pub use error::{ErrorKind, JobError, Stage};
pub use id::{IdGen, JobId, SequentialIdGen, UuidIdGen};
pub use job::{Effect, Job, JobReport, JobState, Source, SourceSpec, TransitionError};
