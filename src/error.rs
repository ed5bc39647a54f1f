use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImageGenError>;

#[derive(Debug, Error)]
pub enum ImageGenError {
    #[error("configuration `{0}` is not set")]
    MissingConfiguration(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("provider rejected submission with status {status}: {body}")]
    ProviderSubmitError { status: u16, body: String },
    #[error("provider poll for job `{job_id}` failed with status {status}: {body}")]
    ProviderPollError {
        job_id: String,
        status: u16,
        body: String,
    },
    #[error("job `{job_id}` failed with status `{status}`")]
    JobFailed { job_id: String, status: String },
    #[error("job `{job_id}` was moderated by the provider (`{status}`)")]
    ContentModerated { job_id: String, status: String },
    #[error("job `{job_id}` did not finish within {elapsed:?}")]
    JobTimeout { job_id: String, elapsed: Duration },
    #[error("job `{job_id}` is ready but carries no artifact reference")]
    MissingArtifact { job_id: String },
    #[error("tool `{0}` not registered")]
    ToolNotRegistered(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("http transport error: {0}")]
    Http(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImageGenError {
    /// 任务类失败（终态或超时），调用方可以据此决定是否以新任务重试
    pub fn is_job_failure(&self) -> bool {
        matches!(
            self,
            ImageGenError::JobFailed { .. }
                | ImageGenError::ContentModerated { .. }
                | ImageGenError::JobTimeout { .. }
                | ImageGenError::MissingArtifact { .. }
        )
    }
}

impl From<reqwest::Error> for ImageGenError {
    fn from(err: reqwest::Error) -> Self {
        ImageGenError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for ImageGenError {
    fn from(err: serde_json::Error) -> Self {
        ImageGenError::Serialization(err.to_string())
    }
}
