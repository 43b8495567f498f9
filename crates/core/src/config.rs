// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service configuration
//!
//! Loaded once at startup and handed to the store, invoker and pipeline
//! constructors. Every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub storage: StorageConfig,
    pub fetch: FetchConfig,
    pub transcode: TranscodeConfig,
    pub separate: SeparateConfig,
    pub retention: RetentionConfig,
    pub invoker: InvokerConfig,
}

/// Artifact locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Per-job working directories and shared model-output directories
    pub artifact_root: PathBuf,
    /// Where the upload layer drops incoming files
    pub upload_root: PathBuf,
    /// Static-serving prefix for published outputs
    pub public_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifact_root: PathBuf::from("downloads"),
            upload_root: PathBuf::from("uploads"),
            public_prefix: "/downloads".to_string(),
        }
    }
}

/// Fetch tool (yt-dlp compatible)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub program: String,
    /// Cookie jar passed with `--cookies` when the file exists
    pub cookies: Option<PathBuf>,
    pub audio_format: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Output substrings meaning the source needs a signed-in session
    pub auth_markers: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            cookies: Some(PathBuf::from("config/cookies.txt")),
            audio_format: "mp3".to_string(),
            timeout: Duration::from_secs(10 * 60),
            auth_markers: vec!["Sign in to confirm".to_string()],
        }
    }
}

/// Transcode tool (ffmpeg compatible)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranscodeConfig {
    pub program: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            timeout: Duration::from_secs(10 * 60),
        }
    }
}

/// Which separation tool produces the vocal/accompaniment stems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeparatorBackend {
    #[default]
    Spleeter,
    Demucs,
}

impl SeparatorBackend {
    pub fn default_program(&self) -> &'static str {
        match self {
            SeparatorBackend::Spleeter => "spleeter",
            SeparatorBackend::Demucs => "python3",
        }
    }
}

/// Separation tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeparateConfig {
    pub backend: SeparatorBackend,
    /// Defaults to the backend's usual entry point
    pub program: Option<String>,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl SeparateConfig {
    pub fn program(&self) -> &str {
        self.program
            .as_deref()
            .unwrap_or_else(|| self.backend.default_program())
    }
}

impl Default for SeparateConfig {
    fn default() -> Self {
        Self {
            backend: SeparatorBackend::default(),
            program: None,
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// Retention sweep policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetentionConfig {
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Entries younger than this are never reclaimed
    #[serde(with = "humantime_serde")]
    pub min_age: Duration,
    /// Extra top-level names to treat as shared directories
    pub protected: Vec<String>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            min_age: Duration::from_secs(30 * 60),
            protected: Vec::new(),
        }
    }
}

/// Tool invoker limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InvokerConfig {
    /// Bytes of stdout/stderr kept per stream
    pub tail_bytes: usize,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self { tail_bytes: 8 * 1024 }
    }
}

impl Config {
    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, resolving relative paths against its directory
    ///
    /// A relative `path` (even a bare file name) is anchored at the current
    /// directory first, so the loaded roots are always absolute.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let read_error = |source: std::io::Error| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        };
        let content = std::fs::read_to_string(path).map_err(read_error)?;
        let mut config: Config = toml::from_str(&content)?;
        let absolute = std::path::absolute(path).map_err(read_error)?;
        if let Some(base) = absolute.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Join every relative path onto `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.storage.artifact_root);
        resolve(&mut self.storage.upload_root);
        if let Some(cookies) = self.fetch.cookies.as_mut() {
            resolve(cookies);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.invoker.tail_bytes == 0 {
            return Err(ConfigError::Invalid(
                "invoker.tail_bytes must be positive".to_string(),
            ));
        }
        if self.retention.interval.is_zero() {
            return Err(ConfigError::Invalid(
                "retention.interval must be positive".to_string(),
            ));
        }
        let programs = [
            ("fetch.program", self.fetch.program.as_str()),
            ("transcode.program", self.transcode.program.as_str()),
            ("separate.program", self.separate.program()),
        ];
        for (name, program) in programs {
            if program.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
            }
        }
        if self.fetch.audio_format.is_empty()
            || !self
                .fetch
                .audio_format
                .bytes()
                .all(|b| b.is_ascii_alphanumeric())
        {
            return Err(ConfigError::Invalid(
                "fetch.audio_format must be a plain extension".to_string(),
            ));
        }
        // Either root nested in the other would be swept as one entry
        let (artifacts, uploads) = (&self.storage.artifact_root, &self.storage.upload_root);
        if artifacts.starts_with(uploads) || uploads.starts_with(artifacts) {
            return Err(ConfigError::Invalid(
                "storage.artifact_root and storage.upload_root must not overlap".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
