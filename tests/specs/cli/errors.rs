//! CLI error specs

use crate::prelude::*;

#[test]
fn submit_without_source_is_a_usage_error() {
    let temp = Project::empty();
    temp.fx().args(&["submit"]).fails().stderr_has("required");
}

#[test]
fn submit_with_both_sources_is_a_usage_error() {
    let temp = Project::empty();
    temp.fx()
        .args(&["submit", "--url", "https://example.com/v", "--file", "a.mp3"])
        .fails()
        .stderr_has("cannot be used with");
}

#[test]
fn unknown_command_fails() {
    let temp = Project::empty();
    temp.fx().args(&["explode"]).fails();
}

#[test]
fn ping_without_daemon_fails() {
    let temp = Project::empty();
    temp.fx()
        .args(&["ping"])
        .fails()
        .stderr_has("daemon not running");
}
