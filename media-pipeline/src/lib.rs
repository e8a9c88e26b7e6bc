//! Media Pipeline Library
//!
//! This library provides the asynchronous transcoding pipeline:
//! - Queue manager that discovers uploaded files and feeds them one at a time
//! - Worker supervisor that drives an isolated transcode process
//! - Health check endpoint
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


pub mod health;
pub mod queue;
pub mod supervisor;

pub use queue::{JobDispatch, QueueManager};
pub use supervisor::{JobOutcome, WorkerSupervisor};
