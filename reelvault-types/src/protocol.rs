//! Worker supervision protocol vocabulary
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


use std::str::FromStr;

/// Commands sent from the supervisor to the worker, one line each on the
/// worker's stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Validate the source and create the output bucket layout.
    Preset,
    /// Produce thumbnail, renditions, and manifest entries.
    Parse,
    /// Self-terminate with exit code 0.
    Done,
}

impl WorkerCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerCommand::Preset => "preset",
            WorkerCommand::Parse => "parse",
            WorkerCommand::Done => "done",
        }
    }
}

impl std::fmt::Display for WorkerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preset" => Ok(WorkerCommand::Preset),
            "parse" => Ok(WorkerCommand::Parse),
            "done" => Ok(WorkerCommand::Done),
            other => Err(format!("unknown worker command: {other}")),
        }
    }
}

/// Acknowledgements sent from the worker to the supervisor, one line each on
/// the worker's stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerAck {
    PresetDone,
    ParseDone,
}

impl WorkerAck {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerAck::PresetDone => "preset:done",
            WorkerAck::ParseDone => "parse:done",
        }
    }
}

impl std::fmt::Display for WorkerAck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerAck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preset:done" => Ok(WorkerAck::PresetDone),
            "parse:done" => Ok(WorkerAck::ParseDone),
            other => Err(format!("unknown worker acknowledgement: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_round_trip() {
        for cmd in [WorkerCommand::Preset, WorkerCommand::Parse, WorkerCommand::Done] {
            assert_eq!(cmd.as_str().parse::<WorkerCommand>().unwrap(), cmd);
        }
    }

    #[test]
    fn test_ack_wire_strings() {
        assert_eq!(WorkerAck::PresetDone.as_str(), "preset:done");
        assert_eq!(WorkerAck::ParseDone.as_str(), "parse:done");
        assert_eq!("preset:done".parse::<WorkerAck>().unwrap(), WorkerAck::PresetDone);
    }

    #[test]
    fn test_unknown_input_is_rejected() {
        assert!("reset".parse::<WorkerCommand>().is_err());
        assert!("preset".parse::<WorkerAck>().is_err());
    }
}
