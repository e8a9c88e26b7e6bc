//! Media Pipeline
//!
//! Discovers uploaded video files in the intake directory and converts each
//! one into streaming renditions:
//! - Polls the intake directory and keeps a FIFO queue of pending jobs
//! - Spawns one isolated transcode worker per job and supervises it
//! - Records job state through the media server's state endpoint
//! - Deletes resolved sources, quarantines failed ones
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
use media_pipeline::health::HealthServer;
use media_pipeline::{QueueManager, WorkerSupervisor};
use reelvault_config::AppConfig;
use reelvault_logging::init_console_logging;
use statestore_client::{HttpStateStore, StateStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_console_logging("media-pipeline", "info");

    info!("Starting Media Pipeline");

    // Load configuration
    let config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    std::fs::create_dir_all(&config.pipeline.intake_dir)?;
    std::fs::create_dir_all(&config.pipeline.media_dir)?;

    info!(
        intake_dir = %config.pipeline.intake_dir.display(),
        media_dir = %config.pipeline.media_dir.display(),
        state_endpoint = config.state_store.endpoint.as_str(),
        "Configuration loaded"
    );

    // Wire up the supervisor and queue
    let state_store: Arc<dyn StateStore> =
        Arc::new(HttpStateStore::new(&config.state_store.endpoint));

    let worker_bin = resolve_worker_bin(&config);
    info!(worker_bin = %worker_bin.display(), "Transcode worker resolved");

    let supervisor = Arc::new(WorkerSupervisor::new(
        worker_bin,
        config.pipeline.intake_dir.clone(),
        config.pipeline.media_dir.clone(),
        Duration::from_secs(config.pipeline.worker_timeout_secs),
        state_store,
    ));

    let queue = Arc::new(QueueManager::new(
        config.pipeline.intake_dir.clone(),
        Duration::from_secs(config.pipeline.scan_interval_secs),
        supervisor,
    ));

    // Start health check server in background
    let health_port = std::env::var("HEALTH_CHECK_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let health_server = HealthServer::new(health_port, Arc::clone(&queue));
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health_server.start().await {
            error!(error = %e, "Health check server error");
        }
    });

    queue.start();

    // Wait for shutdown signal
    info!("Media Pipeline running. Press Ctrl+C to stop.");
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, initiating graceful shutdown");
        }
        Err(err) => {
            error!(error = %err, "Unable to listen for shutdown signal");
        }
    }

    // Best-effort shutdown: clears queue state but leaves a spawned worker
    // to finish or fail on its own.
    queue.stop();
    health_handle.abort();
    info!("Media Pipeline stopped");

    Ok(())
}

/// Resolve the transcode worker binary: explicit override first, then a
/// sibling of the running executable, then PATH lookup.
fn resolve_worker_bin(config: &AppConfig) -> PathBuf {
    if let Some(path) = &config.pipeline.worker_bin {
        return path.clone();
    }

    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("transcode-worker")))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| PathBuf::from("transcode-worker"))
}
