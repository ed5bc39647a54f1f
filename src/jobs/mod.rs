pub mod client;
pub mod provider;
pub mod types;

pub use client::{AsyncJobClient, JobClientConfig, DEFAULT_JOB_TIMEOUT, DEFAULT_POLL_INTERVAL};
pub use provider::{DynJobProvider, HttpJobProvider, JobProvider};
pub use types::{AsyncJob, JobOutcome, JobResult, JobSnapshot, JobStatus};
