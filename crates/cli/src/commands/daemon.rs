// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon management: `fx ping`, `fx status`, `fx shutdown`

use anyhow::Result;

use crate::client::{daemon_stop, ClientError, DaemonClient, DaemonPaths};
use crate::output::{self, OutputFormat, StatusView};

/// Check the daemon answers, without starting one
pub async fn ping(paths: &DaemonPaths) -> Result<()> {
    let client = match DaemonClient::connect(paths) {
        Ok(client) => client,
        Err(ClientError::DaemonNotRunning) => {
            anyhow::bail!("daemon not running");
        }
        Err(e) => return Err(e.into()),
    };
    let version = client.hello().await?;
    println!("fxd {} is up", version);
    Ok(())
}

pub async fn status(paths: &DaemonPaths, format: OutputFormat) -> Result<()> {
    let client = match DaemonClient::connect(paths) {
        Ok(client) => client,
        Err(ClientError::DaemonNotRunning) => {
            println!("Daemon not running");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let view = StatusView::from(client.status().await?);
    output::print(&view, format);
    Ok(())
}

pub async fn shutdown(paths: &DaemonPaths) -> Result<()> {
    if daemon_stop(paths).await? {
        println!("Daemon stopped");
    } else {
        println!("Daemon not running");
    }
    Ok(())
}
