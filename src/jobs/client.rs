use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::provider::{DynJobProvider, JobProvider};
use super::types::{AsyncJob, JobOutcome, JobResult, JobStatus};
use crate::error::{ImageGenError, Result};

/// 单个任务的总等待时长
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(300);

/// 同一任务两次轮询之间的固定间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Debug)]
pub struct JobClientConfig {
    /// 固定值，无退避、无抖动
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for JobClientConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_JOB_TIMEOUT,
        }
    }
}

enum Wake {
    Polled(Result<()>),
    Cancelled,
    Deadline,
}

/// 异步任务客户端：提交、轮询、判定终态
///
/// 不持有跨任务的可变状态，可以随意克隆并在多个任务间共享；每个任务的
/// 轮询循环独立运行。所有失败都直接返回给调用方，内部从不重试。
#[derive(Clone)]
pub struct AsyncJobClient {
    provider: DynJobProvider,
    config: JobClientConfig,
}

impl AsyncJobClient {
    pub fn new(provider: DynJobProvider) -> Self {
        Self::with_config(provider, JobClientConfig::default())
    }

    pub fn with_config(provider: DynJobProvider, config: JobClientConfig) -> Self {
        Self { provider, config }
    }

    pub fn from_provider<P: JobProvider + 'static>(provider: P) -> Self {
        Self::new(Arc::new(provider))
    }

    pub fn config(&self) -> &JobClientConfig {
        &self.config
    }

    /// 只提交一次；提交不幂等，从不重试
    pub async fn submit(&self, endpoint: &str, credential: &str, payload: &Value) -> Result<AsyncJob> {
        let id = self.provider.submit(endpoint, credential, payload).await?;
        info!(job_id = %id, "job submitted");
        Ok(AsyncJob::new(id))
    }

    pub async fn poll(&self, job: &mut AsyncJob, credential: &str) -> Result<()> {
        let snapshot = self.provider.poll(&job.id, credential).await?;
        debug!(job_id = %job.id, status = %snapshot.status, "job polled");
        job.record(snapshot);
        Ok(())
    }

    /// 轮询直到任务进入终态、自提交起超过 `timeout`，或 `cancel` 被触发
    ///
    /// 截止时间同时约束单次轮询和轮询间隔，慢速提供方无法拖延总等待时间。
    /// 取消同样以 [`ImageGenError::JobTimeout`] 返回。
    #[instrument(skip_all, fields(job_id = %job.id))]
    pub async fn wait_for_result(
        &self,
        job: &mut AsyncJob,
        credential: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<JobResult> {
        let deadline = job.submitted_at + timeout;
        loop {
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => Wake::Cancelled,
                _ = sleep_until(deadline) => Wake::Deadline,
                polled = self.poll(job, credential) => Wake::Polled(polled),
            };
            match polled {
                Wake::Polled(polled) => polled?,
                Wake::Cancelled => return Err(self.timed_out(job, "cancelled")),
                Wake::Deadline => return Err(self.timed_out(job, "deadline exceeded")),
            }

            match &job.status {
                JobStatus::Ready => return Ok(job.result.clone().unwrap_or_default()),
                JobStatus::Pending => {}
                JobStatus::Other(status) => {
                    warn!(status = %status, "unrecognised job status, still waiting");
                }
                status if status.is_moderated() => {
                    warn!(status = %status, "job moderated");
                    return Err(ImageGenError::ContentModerated {
                        job_id: job.id.clone(),
                        status: status.to_string(),
                    });
                }
                status => {
                    warn!(status = %status, "job failed");
                    return Err(ImageGenError::JobFailed {
                        job_id: job.id.clone(),
                        status: status.to_string(),
                    });
                }
            }

            if Instant::now() >= deadline {
                return Err(self.timed_out(job, "deadline exceeded"));
            }

            let next_poll = (Instant::now() + self.config.poll_interval).min(deadline);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.timed_out(job, "cancelled")),
                _ = sleep_until(next_poll) => {}
            }
        }
    }

    /// 提交后调用 [`wait_for_result`](Self::wait_for_result)
    pub async fn run(
        &self,
        endpoint: &str,
        credential: &str,
        payload: &Value,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome> {
        let mut job = self.submit(endpoint, credential, payload).await?;
        let result = self
            .wait_for_result(&mut job, credential, timeout, cancel)
            .await?;

        let artifact_ref = result
            .artifact_ref
            .ok_or_else(|| ImageGenError::MissingArtifact {
                job_id: job.id.clone(),
            })?;

        info!(job_id = %job.id, elapsed = ?job.submitted_at.elapsed(), "job ready");
        Ok(JobOutcome {
            job_id: job.id,
            artifact_ref,
            seed: result.seed,
        })
    }

    /// 在独立的 tokio 任务上以配置的超时执行 [`run`](Self::run)
    pub fn spawn_run(
        &self,
        endpoint: impl Into<String>,
        credential: impl Into<String>,
        payload: Value,
        cancel: CancellationToken,
    ) -> JoinHandle<Result<JobOutcome>> {
        let client = self.clone();
        let endpoint = endpoint.into();
        let credential = credential.into();
        tokio::spawn(async move {
            let timeout = client.config.timeout;
            client
                .run(&endpoint, &credential, &payload, timeout, &cancel)
                .await
        })
    }

    fn timed_out(&self, job: &AsyncJob, reason: &'static str) -> ImageGenError {
        let elapsed = job.submitted_at.elapsed();
        warn!(job_id = %job.id, ?elapsed, reason, "stopped waiting for job");
        ImageGenError::JobTimeout {
            job_id: job.id.clone(),
            elapsed,
        }
    }
}
