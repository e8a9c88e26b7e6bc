//! Queue Manager - intake discovery and FIFO job scheduling
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


use async_trait::async_trait;
use reelvault_types::Job;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::supervisor::JobOutcome;

/// Runs one job to its terminal state. Implemented by the worker supervisor;
/// tests substitute a recording stub.
#[async_trait]
pub trait JobDispatch: Send + Sync {
    async fn run(&self, job: Job) -> JobOutcome;
}

/// List candidate jobs in the intake directory, in the filesystem's listing
/// order. Quarantined entries and names without a numeric stem are skipped.
pub fn scan_intake(intake_dir: &Path) -> VecDeque<Job> {
    let entries = match std::fs::read_dir(intake_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(intake_dir = %intake_dir.display(), error = %e, "Failed to list intake directory");
            return VecDeque::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            entry
                .file_name()
                .to_str()
                .and_then(Job::from_intake_name)
        })
        .collect()
}

fn find_intake_job(intake_dir: &Path, job_id: u64) -> Option<Job> {
    scan_intake(intake_dir).into_iter().find(|j| j.id == job_id)
}

struct QueueInner {
    intake_dir: PathBuf,
    scan_interval: Duration,
    dispatch: Arc<dyn JobDispatch>,
    pending: Mutex<VecDeque<Job>>,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the supervision task finishes, however it
/// finishes. This is the only place the flag is released.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl QueueInner {
    async fn tick(self: &Arc<Self>) {
        if self.in_flight.load(Ordering::Acquire) {
            return;
        }

        let job = {
            let mut pending = self.pending.lock().expect("pending queue lock poisoned");

            if pending.is_empty() {
                *pending = scan_intake(&self.intake_dir);
                if !pending.is_empty() {
                    info!(
                        count = pending.len(),
                        "Rebuilt pending queue from intake scan"
                    );
                }
            }

            pending.pop_front()
        };

        let Some(job) = job else { return };

        self.in_flight.store(true, Ordering::Release);

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = InFlightGuard(Arc::clone(&inner.in_flight));
            let outcome = inner.dispatch.run(job.clone()).await;
            info!(job_id = job.id, outcome = ?outcome, "Job left the queue");
        });
    }
}

/// Discovers uploaded files and hands them to the dispatcher one at a time.
///
/// At most one job is in flight system-wide; everything else waits in FIFO
/// order. The periodic intake scan doubles as crash-recovery bootstrap, while
/// `enqueue` lets the intake provider skip the polling latency.
pub struct QueueManager {
    inner: Arc<QueueInner>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl QueueManager {
    pub fn new(
        intake_dir: impl Into<PathBuf>,
        scan_interval: Duration,
        dispatch: Arc<dyn JobDispatch>,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                intake_dir: intake_dir.into(),
                scan_interval,
                dispatch,
                pending: Mutex::new(VecDeque::new()),
                in_flight: Arc::new(AtomicBool::new(false)),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Begin the periodic intake scan.
    pub fn start(&self) {
        let mut handle = self.handle.lock().expect("scan task lock poisoned");

        if handle.is_some() {
            warn!("Queue manager already started");
            return;
        }

        let inner = Arc::clone(&self.inner);
        let period = inner.scan_interval;

        *handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                inner.tick().await;
            }
        }));

        info!(
            intake_dir = %self.inner.intake_dir.display(),
            scan_interval_secs = period.as_secs(),
            "Queue manager started"
        );
    }

    /// Cancel the scan task and clear in-memory queue state. An already
    /// spawned worker process is not terminated; shutdown is best-effort.
    pub fn stop(&self) {
        if let Some(handle) = self
            .handle
            .lock()
            .expect("scan task lock poisoned")
            .take()
        {
            handle.abort();
        }

        self.inner
            .pending
            .lock()
            .expect("pending queue lock poisoned")
            .clear();
        self.inner.in_flight.store(false, Ordering::Release);

        info!("Queue manager stopped");
    }

    /// Queue a freshly uploaded job without waiting for the next scan.
    ///
    /// Returns false when no matching intake file exists.
    pub fn enqueue(&self, job_id: u64) -> bool {
        let Some(job) = find_intake_job(&self.inner.intake_dir, job_id) else {
            warn!(job_id = job_id, "Enqueue requested but no intake file found");
            return false;
        };

        let mut pending = self
            .inner
            .pending
            .lock()
            .expect("pending queue lock poisoned");

        if pending.iter().any(|j| j.id == job_id) {
            debug!(job_id = job_id, "Job already pending");
            return true;
        }

        pending.push_back(job);
        debug!(job_id = job_id, "Job enqueued");
        true
    }

    /// Ids currently waiting, in dispatch order.
    pub fn pending_ids(&self) -> Vec<u64> {
        self.inner
            .pending
            .lock()
            .expect("pending queue lock poisoned")
            .iter()
            .map(|j| j.id)
            .collect()
    }

    pub fn is_in_flight(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_missing_directory_is_empty() {
        let jobs = scan_intake(Path::new("/nonexistent/intake"));
        assert!(jobs.is_empty());
    }
}
