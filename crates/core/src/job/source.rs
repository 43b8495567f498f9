// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job sources: a remote URL or an uploaded file

use crate::error::JobError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Source fields as submitted, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<PathBuf>,
}

impl SourceSpec {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            upload: None,
        }
    }

    pub fn upload(path: impl Into<PathBuf>) -> Self {
        Self {
            url: None,
            upload: Some(path.into()),
        }
    }
}

/// Validated source of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Remote(Url),
    Upload(PathBuf),
}

impl Source {
    /// Validate a submitted spec: exactly one of url/upload, and a url must be
    /// an absolute http(s) URL with a host.
    ///
    /// Blank values count as absent.
    pub fn from_spec(spec: &SourceSpec) -> Result<Self, JobError> {
        let url = spec.url.as_deref().map(str::trim).filter(|u| !u.is_empty());
        let upload = spec
            .upload
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty());

        match (url, upload) {
            (Some(_), Some(_)) => Err(JobError::validation(
                "provide either a source url or an uploaded file, not both",
            )),
            (None, None) => Err(JobError::validation(
                "no source url or uploaded file provided",
            )),
            (None, Some(path)) => Ok(Source::Upload(path.clone())),
            (Some(raw), None) => {
                let parsed =
                    Url::parse(raw).map_err(|_| JobError::validation("invalid source url"))?;
                if !matches!(parsed.scheme(), "http" | "https") || parsed.host().is_none() {
                    return Err(JobError::validation(
                        "source url must be an http or https address",
                    ));
                }
                Ok(Source::Remote(parsed))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Source::Remote(_) => "remote",
            Source::Upload(_) => "upload",
        }
    }
}
