pub mod auth;
pub mod codec;
pub mod config;
pub mod error;
pub mod jobs;
pub mod secrets;
pub mod server;
pub mod tools;
pub mod utils;

pub use auth::{RequestVerifier, SignedRequest, Verdict};
pub use config::{EnvConfig, EnvResolver, SecretResolver, ServiceConfig};
pub use error::{ImageGenError, Result};
pub use jobs::{
    AsyncJob, AsyncJobClient, HttpJobProvider, JobClientConfig, JobOutcome, JobProvider,
    JobResult, JobSnapshot, JobStatus,
};
pub use secrets::SecretStore;
pub use server::{router, AppState};
pub use tools::{
    ArtifactClient, DirectImageTool, ImageGeneratorTool, Tool, ToolContext, ToolInvocation,
    ToolOutput, ToolRegistry,
};
pub use utils::logging;
