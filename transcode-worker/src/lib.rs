//! Transcode Worker Library
//!
//! This library implements one worker lifetime for a single job:
//! - Output bucket preparation and source validation
//! - Concurrent rendition encoding and thumbnail extraction
//! - Master manifest assembly
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


pub mod encoder;
pub mod manifest;
pub mod session;

pub use encoder::{Encoder, FfmpegEncoder, SourceProbe};
pub use manifest::ManifestBuilder;
pub use session::{ParseOutcome, WorkerSession};
