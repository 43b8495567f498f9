//! Job submission specs
//!
//! Full round trips through the daemon with stand-in tools.

use crate::prelude::*;

fn public_to_disk(temp: &Project, url: &str) -> std::path::PathBuf {
    let rel = url.strip_prefix("/downloads/").unwrap();
    temp.path().join("downloads").join(rel)
}

#[test]
fn url_without_effect_publishes_fetched_audio() {
    let temp = Project::ready();
    let run = temp
        .fx()
        .args(&["submit", "--url", "https://example.com/watch?v=1", "--json"])
        .passes();

    let report = run.stdout_json();
    assert_eq!(report["state"], "published");
    assert_eq!(report["effect"], "none");
    let primary = report["outputs"]["primary"].as_str().unwrap();
    assert!(primary.starts_with("/downloads/"));
    assert!(primary.ends_with(".mp3"));
    assert_eq!(
        std::fs::read(public_to_disk(&temp, primary)).unwrap(),
        b"ID3fake-audio"
    );
}

#[test]
fn text_output_names_state_and_outputs() {
    let temp = Project::ready();
    temp.fx()
        .args(&["submit", "--url", "https://example.com/v"])
        .passes()
        .stdout_has("published (none)")
        .stdout_has("primary: /downloads/");
}

#[test]
fn slowed_reverb_publishes_processed_file() {
    let temp = Project::ready();
    let run = temp
        .fx()
        .args(&[
            "submit",
            "--url",
            "https://example.com/v",
            "--effect",
            "slowed_reverb",
            "--json",
        ])
        .passes();

    let report = run.stdout_json();
    assert_eq!(report["effect"], "time-stretch-reverb");
    let primary = report["outputs"]["primary"].as_str().unwrap();
    assert!(primary.ends_with("_processed.mp3"), "{primary}");
    assert!(public_to_disk(&temp, primary).is_file());
}

#[test]
fn vocal_isolate_publishes_both_stems() {
    let temp = Project::ready();
    let run = temp
        .fx()
        .args(&[
            "submit",
            "--url",
            "https://example.com/v",
            "--effect",
            "vocal_remove",
            "--json",
        ])
        .passes();

    let report = run.stdout_json();
    let id = report["id"].as_str().unwrap();
    assert_eq!(
        report["outputs"]["vocals"],
        format!("/downloads/spleeter_output/{id}/vocals.wav")
    );
    assert_eq!(
        report["outputs"]["accompaniment"],
        format!("/downloads/spleeter_output/{id}/accompaniment.wav")
    );
}

#[test]
fn unknown_effect_falls_back_to_none() {
    let temp = Project::ready();
    temp.fx()
        .args(&["submit", "--url", "https://example.com/v", "--effect", "chipmunk"])
        .passes()
        .stdout_has("published (none)");
}

#[test]
fn sign_in_wall_is_a_distinct_failure() {
    let temp = Project::with_tools(FETCH_AUTH, "");
    let run = temp
        .fx()
        .args(&["submit", "--url", "https://example.com/v", "--json"])
        .fails()
        .stderr_has("fetch_error.auth_required");

    let report = run.stdout_json();
    assert_eq!(report["state"], "failed");
    let detail = report["error"]["detail"].as_str().unwrap();
    assert!(detail.contains("sign-in"));
    // Tool output stays in the daemon log
    assert!(!detail.contains("youtube"));
}

#[test]
fn non_http_url_is_rejected() {
    let temp = Project::ready();
    temp.fx()
        .args(&["submit", "--url", "ftp://example.com/song.mp3"])
        .fails()
        .stdout_has("validation_error");
}

#[test]
fn upload_under_upload_root_is_accepted() {
    let temp = Project::ready();
    temp.file("uploads/1700000000-song.wav", "RIFFupload");

    let run = temp
        .fx()
        .args(&["submit", "--file", "uploads/1700000000-song.wav", "--json"])
        .passes();

    let report = run.stdout_json();
    let primary = report["outputs"]["primary"].as_str().unwrap();
    assert!(primary.ends_with(".wav"), "{primary}");
    assert_eq!(
        std::fs::read(public_to_disk(&temp, primary)).unwrap(),
        b"RIFFupload"
    );
}

#[test]
fn upload_outside_upload_root_is_rejected() {
    let temp = Project::ready();
    let outside = temp.file("elsewhere/song.mp3", "ID3");

    temp.fx()
        .args(&["submit", "--file", outside.to_str().unwrap()])
        .fails()
        .stdout_has("validation_error");
}
