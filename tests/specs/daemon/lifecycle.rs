//! Daemon lifecycle specs
//!
//! Verify auto-start, status, shutdown and startup failures.

use crate::prelude::*;

#[test]
fn status_when_not_running() {
    let temp = Project::empty();
    temp.fx()
        .args(&["status"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn shutdown_when_not_running() {
    let temp = Project::empty();
    temp.fx()
        .args(&["shutdown"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn sweep_auto_starts_the_daemon() {
    let temp = Project::ready();
    temp.fx().args(&["sweep"]).passes().stdout_has("examined");

    temp.fx().args(&["ping"]).passes().stdout_has("is up");
    temp.fx()
        .args(&["status"])
        .passes()
        .stdout_has("Daemon running")
        .stdout_has("active jobs: 0");

    assert!(temp.state_dir().join("fxd.sock").exists());
    assert!(temp.state_dir().join("fxd.pid").exists());
}

#[test]
fn status_json_is_machine_readable() {
    let temp = Project::ready();
    temp.fx().args(&["sweep"]).passes();

    let run = temp.fx().args(&["status", "--json"]).passes();
    let json = run.stdout_json();
    assert_eq!(json["active_jobs"], 0);
    assert!(json["last_sweep"]["examined"].is_number());
}

#[test]
fn shutdown_stops_and_cleans_up() {
    let temp = Project::ready();
    temp.fx().args(&["sweep"]).passes();

    temp.fx()
        .args(&["shutdown"])
        .passes()
        .stdout_has("Daemon stopped");

    assert!(!temp.state_dir().join("fxd.sock").exists());
    assert!(!temp.state_dir().join("fxd.pid").exists());
    temp.fx()
        .args(&["status"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn log_starts_with_marker_and_readiness() {
    let temp = Project::ready();
    temp.fx().args(&["sweep"]).passes();

    let log = std::fs::read_to_string(temp.state_dir().join("fxd.log")).unwrap();
    assert!(log.contains("--- fxd: starting (pid: "));
    assert!(log.contains("Daemon ready"));
}

#[test]
fn invalid_config_is_reported_by_the_client() {
    let temp = Project::with_tools(FETCH_OK, "[invoker]\ntail_bytes = 0\n");
    temp.fx()
        .args(&["sweep"])
        .fails()
        .stderr_has("tail_bytes");
    assert!(!temp.state_dir().join("fxd.sock").exists());
}
