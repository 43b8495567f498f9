//! Retention specs
//!
//! Finished jobs are reclaimed by the sweeper once old enough.

use crate::prelude::*;

#[test]
fn recent_outputs_survive_a_sweep() {
    let temp = Project::ready();
    let run = temp
        .fx()
        .args(&["submit", "--url", "https://example.com/v", "--json"])
        .passes();
    let id = run.stdout_json()["id"].as_str().unwrap().to_string();

    temp.fx().args(&["sweep"]).passes().stdout_has("purged 0");
    assert!(temp.path().join("downloads").join(&id).is_dir());
}

#[test]
fn old_outputs_are_reclaimed() {
    let temp = Project::with_tools(FETCH_OK, "[retention]\nmin_age = \"0s\"\n");
    let run = temp
        .fx()
        .args(&["submit", "--url", "https://example.com/v", "--json"])
        .passes();
    let id = run.stdout_json()["id"].as_str().unwrap().to_string();
    temp.file("uploads/stale.mp3", "ID3");

    temp.fx().args(&["sweep"]).passes().stdout_has("purged 2");

    assert!(!temp.path().join("downloads").join(&id).exists());
    assert!(!temp.path().join("uploads/stale.mp3").exists());
    assert!(temp.path().join("downloads").is_dir());
}
