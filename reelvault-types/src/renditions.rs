//! Rendition ladder and per-rendition outcome policy
// Copyright 2025 Reelvault Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// One target rendition: name, vertical resolution, and video bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenditionDescriptor {
    pub name: &'static str,
    pub height: u32,
    pub bitrate_kbps: u32,
}

impl RenditionDescriptor {
    /// BANDWIDTH value for the master playlist, in bits per second.
    pub fn bandwidth_bits(&self) -> u64 {
        self.bitrate_kbps as u64 * 1000
    }

    /// RESOLUTION label for the master playlist (`1080p` form).
    pub fn resolution_label(&self) -> &'static str {
        self.name
    }
}

/// The configured rendition ladder, highest quality first. Master playlist
/// entries follow this order.
pub const RENDITION_LADDER: [RenditionDescriptor; 3] = [
    RenditionDescriptor {
        name: "1080p",
        height: 1080,
        bitrate_kbps: 8000,
    },
    RenditionDescriptor {
        name: "720p",
        height: 720,
        bitrate_kbps: 5000,
    },
    RenditionDescriptor {
        name: "480p",
        height: 480,
        bitrate_kbps: 2500,
    },
];

/// Runtime result of one rendition encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionOutput {
    pub descriptor: RenditionDescriptor,
    /// Sub-playlist location inside the output bucket.
    pub playlist_path: PathBuf,
    pub completed: bool,
}

/// Decides the job-level outcome from the per-rendition results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenditionFailurePolicy {
    /// The job fails unless every configured rendition completed.
    #[default]
    AllMustSucceed,
    /// The job succeeds as long as at least one rendition completed.
    AnySuccess,
}

impl RenditionFailurePolicy {
    pub fn is_satisfied(&self, outputs: &[RenditionOutput]) -> bool {
        match self {
            RenditionFailurePolicy::AllMustSucceed => outputs.iter().all(|o| o.completed),
            RenditionFailurePolicy::AnySuccess => outputs.iter().any(|o| o.completed),
        }
    }
}

impl FromStr for RenditionFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(RenditionFailurePolicy::AllMustSucceed),
            "any" => Ok(RenditionFailurePolicy::AnySuccess),
            other => Err(format!("unknown rendition policy: {other} (expected 'all' or 'any')")),
        }
    }
}
