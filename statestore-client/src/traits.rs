//! Traits for state store operations

use async_trait::async_trait;
use reelvault_types::JobState;

/// Trait for durable job-state recording
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Durably record the status of a job
    async fn set_state(&self, job_id: u64, state: JobState) -> Result<(), crate::error::StateStoreError>;

    /// Get the client type name
    fn client_type(&self) -> &str;
}
