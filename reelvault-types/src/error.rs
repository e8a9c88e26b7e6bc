//! Error types for the transcoding pipeline
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


use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while processing a job.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no such source file: {0}")]
    MissingSource(PathBuf),

    #[error("encoder failed for rendition {rendition}: {reason}")]
    Encoder { rendition: String, reason: String },

    #[error("worker process error: {0}")]
    Process(String),

    #[error("timed out waiting for {0}")]
    ProtocolTimeout(String),

    #[error("unexpected protocol message: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
