// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external tools

pub mod tool;
pub mod traced;

pub use tool::{
    FailureMarker, MarkerKind, ProcessToolAdapter, ToolAdapter, ToolError, ToolErrorKind,
    ToolInvocation, ToolOutput,
};
pub use tokio_util::sync::CancellationToken;
pub use traced::TracedToolAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use tool::{FakeToolAdapter, ToolCall};
