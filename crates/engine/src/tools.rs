// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command layouts for the external tools
//!
//! Each builder returns the invocation together with the files the tool
//! promises to produce. Output locations are declared here per tool version
//! and checked at verify time; nothing is discovered by listing directories.

use fx_adapters::{FailureMarker, MarkerKind, ToolInvocation};
use fx_core::{Config, FetchConfig, JobId, SeparateConfig, SeparatorBackend, TranscodeConfig};
use std::path::{Path, PathBuf};
use url::Url;

/// Tempo ratio and echo parameters of the time-stretch-reverb chain
pub const REVERB_FILTER: &str = "atempo=0.85,aecho=0.8:0.9:1000:0.3";

/// A file a tool run must leave behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedOutput {
    /// Logical name the output is published under
    pub name: &'static str,
    pub path: PathBuf,
}

/// An invocation plus what it promises
#[derive(Debug, Clone)]
pub struct ToolPlan {
    pub invocation: ToolInvocation,
    pub outputs: Vec<ExpectedOutput>,
}

/// On-disk convention of a separation tool version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparationLayout {
    /// spleeter 2.x `separate -p spleeter:2stems`
    SpleeterV1,
    /// demucs 4.x with the default htdemucs model
    HtDemucsV4,
}

impl SeparationLayout {
    pub fn for_backend(backend: SeparatorBackend) -> Self {
        match backend {
            SeparatorBackend::Spleeter => SeparationLayout::SpleeterV1,
            SeparatorBackend::Demucs => SeparationLayout::HtDemucsV4,
        }
    }

    /// Shared directory under the artifact root the tool writes into
    pub fn model_dir(&self) -> &'static str {
        match self {
            SeparationLayout::SpleeterV1 => "spleeter_output",
            SeparationLayout::HtDemucsV4 => "htdemucs",
        }
    }

    /// Logical stem name -> file name inside `<model_dir>/<input stem>/`
    pub fn stems(&self) -> [(&'static str, &'static str); 2] {
        match self {
            SeparationLayout::SpleeterV1 => [
                ("vocals", "vocals.wav"),
                ("accompaniment", "accompaniment.wav"),
            ],
            SeparationLayout::HtDemucsV4 => {
                [("vocals", "vocals.wav"), ("accompaniment", "no_vocals.wav")]
            }
        }
    }

    /// Every model directory any layout writes to
    pub fn all_model_dirs() -> [&'static str; 2] {
        [
            SeparationLayout::SpleeterV1.model_dir(),
            SeparationLayout::HtDemucsV4.model_dir(),
        ]
    }
}

/// Builds tool invocations from configuration
#[derive(Debug, Clone)]
pub struct ToolLayout {
    fetch: FetchConfig,
    transcode: TranscodeConfig,
    separate: SeparateConfig,
}

impl ToolLayout {
    pub fn new(config: &Config) -> Self {
        Self {
            fetch: config.fetch.clone(),
            transcode: config.transcode.clone(),
            separate: config.separate.clone(),
        }
    }

    pub fn audio_format(&self) -> &str {
        &self.fetch.audio_format
    }

    pub fn separation(&self) -> SeparationLayout {
        SeparationLayout::for_backend(self.separate.backend)
    }

    pub fn configured_cookies(&self) -> Option<&Path> {
        self.fetch.cookies.as_deref()
    }

    /// Cookies file to pass, if configured and present
    pub fn cookies(&self) -> Option<&Path> {
        self.configured_cookies().filter(|p| p.is_file())
    }

    /// Download `url` as `<workdir>/<id>.<format>`
    ///
    /// The URL goes after `--` so it can never be read as an option.
    pub fn fetch(&self, id: &JobId, url: &Url, workdir: &Path, cookies: Option<&Path>) -> ToolPlan {
        let format = &self.fetch.audio_format;
        let mut invocation =
            ToolInvocation::new(&self.fetch.program, workdir, self.fetch.timeout);
        if let Some(cookies) = cookies {
            invocation = invocation.arg("--cookies").arg(cookies);
        }
        invocation = invocation
            .args(["--no-check-certificate", "--no-playlist", "-x", "--audio-format"])
            .arg(format)
            .arg("-o")
            .arg(workdir.join(format!("{}.%(ext)s", id)))
            .arg("--")
            .arg(url.as_str());
        for pattern in &self.fetch.auth_markers {
            invocation = invocation.marker(FailureMarker::new(pattern, MarkerKind::AuthRequired));
        }

        ToolPlan {
            invocation,
            outputs: vec![ExpectedOutput {
                name: "primary",
                path: workdir.join(format!("{}.{}", id, format)),
            }],
        }
    }

    /// Slow down and add echo, writing `<workdir>/<id>_processed.<ext>`
    pub fn transcode(&self, id: &JobId, primary: &Path, workdir: &Path) -> ToolPlan {
        let ext = primary
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.fetch.audio_format.clone());
        let output = workdir.join(format!("{}_processed.{}", id, ext));

        let invocation =
            ToolInvocation::new(&self.transcode.program, workdir, self.transcode.timeout)
                .args(["-hide_banner", "-nostdin", "-y", "-i"])
                .arg(primary)
                .args(["-filter_complex", REVERB_FILTER])
                .arg(&output);

        ToolPlan {
            invocation,
            outputs: vec![ExpectedOutput {
                name: "primary",
                path: output,
            }],
        }
    }

    /// Split `primary` into vocals and accompaniment
    ///
    /// `model_dir` is the already reserved `<root>/<layout.model_dir()>`. The
    /// tool names its per-input subdirectory after the input's file stem,
    /// which is the job id.
    pub fn separate(
        &self,
        id: &JobId,
        primary: &Path,
        workdir: &Path,
        model_dir: &Path,
    ) -> ToolPlan {
        let layout = self.separation();
        let program = self.separate.program();
        let timeout = self.separate.timeout;

        let invocation = match layout {
            SeparationLayout::SpleeterV1 => ToolInvocation::new(program, workdir, timeout)
                .args(["separate", "-p", "spleeter:2stems", "-o"])
                .arg(model_dir)
                .arg(primary),
            SeparationLayout::HtDemucsV4 => {
                // demucs appends the model name to -o itself
                let out_root = model_dir.parent().unwrap_or(model_dir);
                ToolInvocation::new(program, workdir, timeout)
                    .args(["-m", "demucs", "--two-stems=vocals", "-o"])
                    .arg(out_root)
                    .arg(primary)
                    .env("TORCHAUDIO_AUDIO_BACKEND", "soundfile")
            }
        };

        let stem_dir = model_dir.join(id.as_str());
        let outputs = layout
            .stems()
            .into_iter()
            .map(|(name, file)| ExpectedOutput {
                name,
                path: stem_dir.join(file),
            })
            .collect();

        ToolPlan {
            invocation,
            outputs,
        }
    }
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
