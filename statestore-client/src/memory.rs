//! In-memory state store for tests

use async_trait::async_trait;
use reelvault_types::JobState;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::traits::StateStore;

/// State store that records transitions in memory. Used by tests and local
/// development runs that have no media server to report to.
#[derive(Default)]
pub struct MemoryStateStore {
    states: Mutex<HashMap<u64, Vec<JobState>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest recorded state for a job, if any.
    pub fn current_state(&self, job_id: u64) -> Option<JobState> {
        self.states
            .lock()
            .expect("state map lock poisoned")
            .get(&job_id)
            .and_then(|history| history.last().copied())
    }

    /// Every state recorded for a job, in order.
    pub fn history(&self, job_id: u64) -> Vec<JobState> {
        self.states
            .lock()
            .expect("state map lock poisoned")
            .get(&job_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn set_state(&self, job_id: u64, state: JobState) -> Result<()> {
        debug!(job_id = job_id, state = %state, "Recording job state");

        self.states
            .lock()
            .expect("state map lock poisoned")
            .entry(job_id)
            .or_default()
            .push(state);

        Ok(())
    }

    fn client_type(&self) -> &str {
        "memory"
    }
}
