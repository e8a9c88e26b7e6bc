//! Transcode Worker
//!
//! Isolated process that converts a single uploaded video into streaming
//! renditions. Spawned by the media pipeline with two positional arguments
//! (absolute source path, absolute output bucket path) and driven over
//! stdin/stdout with short textual commands:
//! - `preset` -> validate the source, create the bucket layout, ack `preset:done`
//! - `parse`  -> thumbnail + all rendition encodes, ack `parse:done`
//! - `done`   -> exit 0
//!
//! All logging goes to stderr; stdout carries only protocol acknowledgements.
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


use anyhow::Result;
use reelvault_config::AppConfig;
use reelvault_logging::init_worker_logging;
use reelvault_types::{WorkerAck, WorkerCommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use transcode_worker::{FfmpegEncoder, WorkerSession};

fn send_ack(ack: WorkerAck) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}", ack)?;
    stdout.flush()
}

#[tokio::main]
async fn main() -> Result<()> {
    init_worker_logging("transcode-worker", "info");

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        error!("Missing source file and output directory path");
        std::process::exit(1);
    }

    let source = PathBuf::from(&args[1]);
    let bucket = PathBuf::from(&args[2]);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    info!(
        source = %source.display(),
        bucket = %bucket.display(),
        "Transcode worker started"
    );

    let session = WorkerSession::new(
        source,
        bucket,
        config.pipeline.rendition_policy,
        Arc::new(FfmpegEncoder::new()),
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match line.trim().parse::<WorkerCommand>() {
            Ok(WorkerCommand::Preset) => match session.preset().await {
                Ok(()) => send_ack(WorkerAck::PresetDone)?,
                Err(e) => {
                    error!(error = %e, "Preset failed");
                    std::process::exit(1);
                }
            },
            Ok(WorkerCommand::Parse) => match session.parse().await {
                Ok(outcome) if outcome.policy_satisfied => send_ack(WorkerAck::ParseDone)?,
                Ok(_) => {
                    error!("Rendition failure policy not satisfied");
                    std::process::exit(1);
                }
                Err(e) => {
                    error!(error = %e, "Parse failed");
                    std::process::exit(1);
                }
            },
            Ok(WorkerCommand::Done) => {
                info!("Conversion finished, worker exiting");
                std::process::exit(0);
            }
            Err(e) => warn!(error = %e, "Ignoring unknown command"),
        }
    }

    // The supervisor closed our stdin without sending `done`.
    warn!("Command channel closed before done, worker exiting");
    std::process::exit(1);
}
