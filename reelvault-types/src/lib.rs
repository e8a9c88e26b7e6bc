//! Reelvault Types
//!
//! Shared type definitions for jobs, renditions, the worker supervision
//! protocol, and errors used across all Reelvault services.

pub mod error;
pub mod job;
pub mod protocol;
pub mod renditions;

pub use error::*;
pub use job::*;
pub use protocol::*;
pub use renditions::*;
