// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fx_core::{Effect, ErrorKind, JobError, JobId, Stage};
use std::time::SystemTime;

fn failed_report() -> JobReport {
    JobReport::rejected(
        JobId::parse("job-1").unwrap(),
        Effect::VocalIsolate,
        JobError::new(ErrorKind::FetchAuthRequired, "source requires sign-in").at(Stage::Fetch),
        SystemTime::UNIX_EPOCH,
    )
}

#[test]
fn published_job_lists_outputs() {
    let mut report = failed_report();
    report.state = JobState::Published;
    report.error = None;
    report.outputs.insert(
        "vocals".to_string(),
        "/downloads/spleeter_output/job-1/vocals.wav".to_string(),
    );

    let view = JobView(&report);
    let text = view.to_string();
    assert!(!view.failed());
    assert!(text.starts_with("Job job-1: published (vocal-isolate)"));
    assert!(text.contains("vocals: /downloads/spleeter_output/job-1/vocals.wav"));
}

#[test]
fn failed_job_shows_kind_stage_and_detail() {
    let report = failed_report();
    let view = JobView(&report);
    let text = view.to_string();

    assert!(view.failed());
    assert!(text.contains("error: fetch_error.auth_required at fetch"));
    assert!(text.contains("detail: source requires sign-in"));
}

#[test]
fn job_json_is_the_report() {
    let report = failed_report();
    let json = serde_json::to_value(JobView(&report)).unwrap();
    assert_eq!(json["id"], "job-1");
    assert_eq!(json["state"], "failed");
}

#[test]
fn status_text_mentions_missing_sweep() {
    let view = StatusView {
        uptime_secs: 90,
        active_jobs: 2,
        last_sweep: None,
    };
    let text = view.to_string();
    assert!(text.contains("up 1m 30s"));
    assert!(text.contains("active jobs: 2"));
    assert!(text.contains("none yet"));
}

#[test]
fn sweep_summary_counts() {
    let view = SweepView(SweepReport {
        examined: 5,
        purged: 2,
        skipped_active: 1,
        skipped_young: 1,
        failures: 1,
    });
    assert_eq!(
        view.to_string(),
        "examined 5, purged 2, kept 1 active and 1 recent, 1 failed"
    );
}
