//! Job identity and lifecycle states
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
use std::path::{Path, PathBuf};

/// Filename prefix that removes a source file from future intake scans.
pub const QUARANTINE_PREFIX: &str = "_";

/// One unit of transcoding work, derived from a file in the intake directory.
///
/// The id is the numeric stem of the intake filename (`17.mp4` -> 17).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier, shared with the media server's post record.
    pub id: u64,

    /// Intake filename including extension.
    pub filename: String,
}

impl Job {
    /// Build a job from an intake directory entry, if the filename has a
    /// numeric stem and does not carry the quarantine prefix.
    pub fn from_intake_name(filename: &str) -> Option<Self> {
        if filename.starts_with(QUARANTINE_PREFIX) {
            return None;
        }

        let stem = filename.split('.').next()?;
        let id = stem.parse::<u64>().ok()?;

        Some(Self {
            id,
            filename: filename.to_string(),
        })
    }

    /// Absolute path of the source file inside the intake directory.
    pub fn source_path(&self, intake_dir: &Path) -> PathBuf {
        intake_dir.join(&self.filename)
    }

    /// Absolute path of this job's output bucket under the media root.
    pub fn bucket_path(&self, media_dir: &Path) -> PathBuf {
        media_dir.join(self.id.to_string())
    }

    /// Filename used when the source is kept after a failed conversion.
    pub fn quarantined_filename(&self) -> String {
        format!("{}{}", QUARANTINE_PREFIX, self.filename)
    }
}

/// Lifecycle states of a job, as recorded by the persistence collaborator.
///
/// States are monotonic per job; `parse_error` is terminal and never
/// retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Created,
    Uploaded,
    /// Renditions are being produced. The persistence layer historically
    /// labels this phase `parsing`; both names address the same state.
    Converting,
    Parsing,
    ParseError,
    Done,
}

impl JobState {
    /// Wire name used by the persistence collaborator.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Created => "created",
            JobState::Uploaded => "uploaded",
            JobState::Converting => "converting",
            JobState::Parsing => "parsing",
            JobState::ParseError => "parse_error",
            JobState::Done => "done",
        }
    }

    /// Whether a job in this state has permanently left the queue.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::ParseError)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_from_intake_name() {
        let job = Job::from_intake_name("42.mp4").unwrap();
        assert_eq!(job.id, 42);
        assert_eq!(job.filename, "42.mp4");
    }

    #[test]
    fn test_quarantined_names_are_rejected() {
        assert!(Job::from_intake_name("_42.mp4").is_none());
    }

    #[test]
    fn test_non_numeric_stems_are_rejected() {
        assert!(Job::from_intake_name("readme.txt").is_none());
        assert!(Job::from_intake_name(".hidden").is_none());
    }

    #[test]
    fn test_paths_and_quarantine_name() {
        let job = Job::from_intake_name("7.mkv").unwrap();
        assert_eq!(
            job.source_path(Path::new("/data/intake")),
            PathBuf::from("/data/intake/7.mkv")
        );
        assert_eq!(
            job.bucket_path(Path::new("/data/media")),
            PathBuf::from("/data/media/7")
        );
        assert_eq!(job.quarantined_filename(), "_7.mkv");
    }

    #[test]
    fn test_state_wire_names() {
        assert_eq!(JobState::ParseError.as_str(), "parse_error");
        assert_eq!(
            serde_json::to_string(&JobState::Converting).unwrap(),
            "\"converting\""
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Done.is_terminal());
        assert!(JobState::ParseError.is_terminal());
        assert!(!JobState::Converting.is_terminal());
    }
}
