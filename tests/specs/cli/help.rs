//! CLI help specs

use crate::prelude::*;

#[test]
fn help_lists_every_command() {
    let temp = Project::empty();
    let run = temp.fx().args(&["--help"]).passes();
    for command in ["submit", "status", "sweep", "ping", "shutdown"] {
        let stdout = String::from_utf8_lossy(&run.output().stdout).to_string();
        assert!(stdout.contains(command), "missing {command} in:\n{stdout}");
    }
}

#[test]
fn submit_help_shows_sources_and_effect() {
    let temp = Project::empty();
    temp.fx()
        .args(&["submit", "--help"])
        .passes()
        .stdout_has("--url")
        .stdout_has("--file")
        .stdout_has("--effect");
}

#[test]
fn version_flag_prints_version() {
    let temp = Project::empty();
    temp.fx()
        .args(&["--version"])
        .passes()
        .stdout_has(env!("CARGO_PKG_VERSION"));
}
