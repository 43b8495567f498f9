// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fx-daemon library: the wire protocol and well-known paths shared with `fx`

pub mod protocol;

pub use protocol::{ProtocolError, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

use std::path::{Path, PathBuf};

/// Lock file holding the daemon PID
pub const LOCK_FILE: &str = "fxd.pid";
/// Daemon version, written at startup
pub const VERSION_FILE: &str = "fxd.version";
pub const LOG_FILE: &str = "fxd.log";

/// Startup marker prefix written to the log before anything else.
/// Full format: "--- fxd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- fxd: starting (pid: ";

/// Directory holding the socket, PID, version and log files
///
/// `FX_STATE_DIR` wins; otherwise the platform state dir, falling back to
/// `~/.local/state` where the platform has none.
pub fn state_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("FX_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/state")))
        .map(|dir| dir.join("fx"))
}

/// Socket path, overridable with `FX_SOCKET_PATH`
pub fn socket_path(state_dir: &Path) -> PathBuf {
    match std::env::var_os("FX_SOCKET_PATH") {
        Some(path) => PathBuf::from(path),
        None => state_dir.join("fxd.sock"),
    }
}
