// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fx job orchestration engine

mod error;
mod pipeline;
mod registry;
mod store;
mod sweeper;
pub mod tools;

pub use error::{RegistryError, StoreError};
pub use pipeline::{EffectPipeline, Ticket};
pub use registry::{JobRegistry, PurgeLease, Registration};
pub use store::{ArtifactStore, Entry};
pub use sweeper::{RetentionSweeper, SweepReport};
pub use tools::{ExpectedOutput, SeparationLayout, ToolLayout, ToolPlan};
