// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use tempfile::TempDir;

fn id() -> JobId {
    JobId::parse("job-1").unwrap()
}

fn layout_with(toml: &str) -> ToolLayout {
    ToolLayout::new(&Config::from_toml(toml).unwrap())
}

#[test]
fn fetch_argv_isolates_the_url() {
    let layout = layout_with("[fetch]\ncookies = \"/nonexistent/cookies.txt\"\n");
    let url = Url::parse("https://example.com/watch?v=1&list=2;rm -rf").unwrap();
    let plan = layout.fetch(&id(), &url, Path::new("/srv/dl/job-1"), None);

    assert_eq!(plan.invocation.program, "yt-dlp");
    assert_eq!(
        plan.invocation.args_lossy(),
        vec![
            "--no-check-certificate",
            "--no-playlist",
            "-x",
            "--audio-format",
            "mp3",
            "-o",
            "/srv/dl/job-1/job-1.%(ext)s",
            "--",
            url.as_str(),
        ]
    );
    assert_eq!(plan.invocation.cwd, PathBuf::from("/srv/dl/job-1"));
    assert_eq!(plan.invocation.timeout, Duration::from_secs(600));
    assert_eq!(
        plan.outputs,
        vec![ExpectedOutput {
            name: "primary",
            path: PathBuf::from("/srv/dl/job-1/job-1.mp3"),
        }]
    );
}

#[test]
fn fetch_passes_cookies_first_and_watches_auth_marker() {
    let dir = TempDir::new().unwrap();
    let cookies = dir.path().join("cookies.txt");
    std::fs::write(&cookies, "# Netscape HTTP Cookie File\n").unwrap();
    let layout = layout_with(&format!(
        "[fetch]\ncookies = \"{}\"\naudio_format = \"m4a\"\n",
        cookies.display()
    ));
    assert_eq!(layout.cookies(), Some(cookies.as_path()));

    let url = Url::parse("https://example.com/video").unwrap();
    let plan = layout.fetch(&id(), &url, dir.path(), layout.cookies());

    let args = plan.invocation.args_lossy();
    assert_eq!(args[0], "--cookies");
    assert_eq!(args[1], cookies.to_string_lossy());
    assert!(plan.outputs[0].path.ends_with("job-1.m4a"));
    assert_eq!(
        plan.invocation.markers,
        vec![FailureMarker::new(
            "Sign in to confirm",
            MarkerKind::AuthRequired
        )]
    );
}

#[test]
fn missing_cookies_file_is_not_passed() {
    let layout = layout_with("[fetch]\ncookies = \"/nonexistent/cookies.txt\"\n");
    assert_eq!(
        layout.configured_cookies(),
        Some(Path::new("/nonexistent/cookies.txt"))
    );
    assert_eq!(layout.cookies(), None);
}

#[test]
fn transcode_uses_fixed_filter_chain() {
    let layout = layout_with("");
    let plan = layout.transcode(
        &id(),
        Path::new("/srv/dl/job-1/job-1.mp3"),
        Path::new("/srv/dl/job-1"),
    );

    assert_eq!(plan.invocation.program, "ffmpeg");
    assert_eq!(
        plan.invocation.args_lossy(),
        vec![
            "-hide_banner",
            "-nostdin",
            "-y",
            "-i",
            "/srv/dl/job-1/job-1.mp3",
            "-filter_complex",
            "atempo=0.85,aecho=0.8:0.9:1000:0.3",
            "/srv/dl/job-1/job-1_processed.mp3",
        ]
    );
    assert_eq!(plan.outputs.len(), 1);
    assert_eq!(plan.outputs[0].name, "primary");
}

#[test]
fn transcode_keeps_the_input_extension() {
    let layout = layout_with("");
    let plan = layout.transcode(
        &id(),
        Path::new("/srv/dl/job-1/job-1.wav"),
        Path::new("/srv/dl/job-1"),
    );
    assert!(plan.outputs[0].path.ends_with("job-1_processed.wav"));
}

#[test]
fn spleeter_layout_declares_both_stems() {
    let layout = layout_with("");
    assert_eq!(layout.separation(), SeparationLayout::SpleeterV1);

    let plan = layout.separate(
        &id(),
        Path::new("/srv/dl/job-1/job-1.mp3"),
        Path::new("/srv/dl/job-1"),
        Path::new("/srv/dl/spleeter_output"),
    );

    assert_eq!(plan.invocation.program, "spleeter");
    assert_eq!(
        plan.invocation.args_lossy(),
        vec![
            "separate",
            "-p",
            "spleeter:2stems",
            "-o",
            "/srv/dl/spleeter_output",
            "/srv/dl/job-1/job-1.mp3",
        ]
    );
    assert_eq!(
        plan.outputs,
        vec![
            ExpectedOutput {
                name: "vocals",
                path: PathBuf::from("/srv/dl/spleeter_output/job-1/vocals.wav"),
            },
            ExpectedOutput {
                name: "accompaniment",
                path: PathBuf::from("/srv/dl/spleeter_output/job-1/accompaniment.wav"),
            },
        ]
    );
}

#[test]
fn demucs_layout_uses_htdemucs_names() {
    let layout = layout_with("[separate]\nbackend = \"demucs\"\n");
    assert_eq!(layout.separation(), SeparationLayout::HtDemucsV4);

    let plan = layout.separate(
        &id(),
        Path::new("/srv/dl/job-1/job-1.mp3"),
        Path::new("/srv/dl/job-1"),
        Path::new("/srv/dl/htdemucs"),
    );

    assert_eq!(plan.invocation.program, "python3");
    assert_eq!(
        plan.invocation.args_lossy(),
        vec![
            "-m",
            "demucs",
            "--two-stems=vocals",
            "-o",
            "/srv/dl",
            "/srv/dl/job-1/job-1.mp3",
        ]
    );
    assert_eq!(
        plan.invocation.env,
        vec![(
            "TORCHAUDIO_AUDIO_BACKEND".to_string(),
            "soundfile".to_string()
        )]
    );
    assert_eq!(
        plan.outputs[1].path,
        PathBuf::from("/srv/dl/htdemucs/job-1/no_vocals.wav")
    );
    assert_eq!(plan.outputs[1].name, "accompaniment");
}

#[test]
fn model_dirs_are_distinct() {
    let [a, b] = SeparationLayout::all_model_dirs();
    assert_ne!(a, b);
}
