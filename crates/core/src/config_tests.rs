// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;
use tempfile::TempDir;
use yare::parameterized;

#[test]
fn empty_document_uses_defaults() {
    let config = Config::from_toml("").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.fetch.program, "yt-dlp");
    assert_eq!(config.fetch.audio_format, "mp3");
    assert_eq!(config.separate.program(), "spleeter");
    assert_eq!(config.retention.interval, Duration::from_secs(300));
}

#[test]
fn durations_use_human_units() {
    let config = Config::from_toml(
        r#"
[fetch]
timeout = "90s"

[retention]
interval = "3s"
min_age = "1h"
protected = ["stems"]
"#,
    )
    .unwrap();

    assert_eq!(config.fetch.timeout, Duration::from_secs(90));
    assert_eq!(config.retention.interval, Duration::from_secs(3));
    assert_eq!(config.retention.min_age, Duration::from_secs(3600));
    assert_eq!(config.retention.protected, vec!["stems".to_string()]);
}

#[test]
fn demucs_backend_defaults_to_python() {
    let config = Config::from_toml(
        r#"
[separate]
backend = "demucs"
"#,
    )
    .unwrap();
    assert_eq!(config.separate.backend, SeparatorBackend::Demucs);
    assert_eq!(config.separate.program(), "python3");
}

#[test]
fn explicit_separator_program_wins() {
    let config = Config::from_toml(
        r#"
[separate]
program = "/opt/spleeter/bin/spleeter"
"#,
    )
    .unwrap();
    assert_eq!(config.separate.program(), "/opt/spleeter/bin/spleeter");
}

#[test]
fn unknown_fields_are_rejected() {
    let err = Config::from_toml("[fetch]\nprogramme = \"yt-dlp\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn zero_tail_is_invalid() {
    let err = Config::from_toml("[invoker]\ntail_bytes = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn zero_interval_is_invalid() {
    let err = Config::from_toml("[retention]\ninterval = \"0s\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn audio_format_must_be_an_extension() {
    let err = Config::from_toml("[fetch]\naudio_format = \"../mp3\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[parameterized(
    same = { "data", "data" },
    uploads_inside = { "downloads", "downloads/uploads" },
    artifacts_inside = { "uploads/downloads", "uploads" },
    absolute_nested = { "/srv/fx", "/srv/fx/uploads" },
)]
fn overlapping_roots_are_invalid(artifacts: &str, uploads: &str) {
    let err = Config::from_toml(&format!(
        "[storage]\nartifact_root = {:?}\nupload_root = {:?}\n",
        artifacts, uploads
    ))
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn sibling_roots_with_shared_prefix_are_valid() {
    let config = Config::from_toml(
        r#"
[storage]
artifact_root = "data"
upload_root = "data-uploads"
"#,
    )
    .unwrap();
    assert_eq!(config.storage.upload_root, PathBuf::from("data-uploads"));
}

#[test]
fn load_rejects_roots_that_overlap_once_resolved() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fx.toml");
    let absolute_uploads = dir.path().join("out/uploads");
    fs::write(
        &path,
        format!(
            "[storage]\nartifact_root = \"out\"\nupload_root = {:?}\n",
            absolute_uploads
        ),
    )
    .unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn load_resolves_relative_paths_against_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fx.toml");
    fs::write(
        &path,
        r#"
[storage]
artifact_root = "out"
upload_root = "/var/fx/uploads"
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.storage.artifact_root, dir.path().join("out"));
    assert_eq!(config.storage.upload_root, PathBuf::from("/var/fx/uploads"));
    assert_eq!(
        config.fetch.cookies,
        Some(dir.path().join("config/cookies.txt"))
    );
}

#[test]
fn load_from_relative_path_yields_absolute_roots() {
    // A relative config location, like `fxd --config fx.toml`
    let dir = TempDir::new_in(".").unwrap();
    let path = PathBuf::from(dir.path().file_name().unwrap()).join("fx.toml");
    assert!(path.is_relative());
    fs::write(&path, "[storage]\nartifact_root = \"downloads\"\n").unwrap();

    let config = Config::load(&path).unwrap();

    let expected = dir.path().canonicalize().unwrap();
    for root in [&config.storage.artifact_root, &config.storage.upload_root] {
        assert!(root.is_absolute(), "{} is relative", root.display());
        assert_eq!(root.parent().unwrap().canonicalize().unwrap(), expected);
    }
    assert_eq!(config.storage.artifact_root.file_name().unwrap(), "downloads");
}

#[test]
fn load_reports_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = Config::load(&dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}
