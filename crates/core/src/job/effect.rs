// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requested audio effect

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of transforms a job can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Effect {
    /// Pass the fetched audio through unchanged
    #[default]
    None,
    /// Slow the track down and add an echo tail
    TimeStretchReverb,
    /// Split the track into vocals and accompaniment
    VocalIsolate,
}

impl Effect {
    /// Parse a requested effect name
    ///
    /// Total: names outside the closed set select [`Effect::None`] so older
    /// clients sending unknown values still get the untouched audio back.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "time-stretch-reverb" | "slowed_reverb" => Effect::TimeStretchReverb,
            "vocal-isolate" | "vocal_remove" => Effect::VocalIsolate,
            "none" | "" => Effect::None,
            other => {
                tracing::debug!(effect = other, "unrecognized effect, passing audio through");
                Effect::None
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::None => "none",
            Effect::TimeStretchReverb => "time-stretch-reverb",
            Effect::VocalIsolate => "vocal-isolate",
        }
    }

    /// Whether this effect runs a transform stage after fetch
    pub fn has_transform(&self) -> bool {
        !matches!(self, Effect::None)
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
