use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// 提供方返回的任务状态
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Pending,
    Ready,
    Error,
    RequestModerated,
    ContentModerated,
    TaskNotFound,
    /// 提供方新增的未知状态，视为仍在运行
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Ready => "Ready",
            JobStatus::Error => "Error",
            JobStatus::RequestModerated => "Request Moderated",
            JobStatus::ContentModerated => "Content Moderated",
            JobStatus::TaskNotFound => "Task not found",
            JobStatus::Other(status) => status,
        }
    }

    /// 进入终态后不再轮询
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Other(_))
    }

    pub fn is_moderated(&self) -> bool {
        matches!(self, JobStatus::RequestModerated | JobStatus::ContentModerated)
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Pending" => JobStatus::Pending,
            "Ready" => JobStatus::Ready,
            "Error" => JobStatus::Error,
            "Request Moderated" => JobStatus::RequestModerated,
            "Content Moderated" => JobStatus::ContentModerated,
            "Task not found" => JobStatus::TaskNotFound,
            _ => JobStatus::Other(value),
        }
    }
}

impl From<JobStatus> for String {
    fn from(value: JobStatus) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 已完成任务的结果
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(
        default,
        rename = "artifactRef",
        alias = "sample",
        skip_serializing_if = "Option::is_none"
    )]
    pub artifact_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// 单次轮询响应
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
}

impl JobSnapshot {
    pub fn new(id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            status,
            result: None,
        }
    }

    pub fn with_result(mut self, result: JobResult) -> Self {
        self.result = Some(result);
        self
    }
}

/// 远端任务；只有轮询会更新其状态
#[derive(Clone, Debug)]
pub struct AsyncJob {
    pub id: String,
    pub status: JobStatus,
    pub submitted_at: Instant,
    pub result: Option<JobResult>,
}

impl AsyncJob {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            submitted_at: Instant::now(),
            result: None,
        }
    }

    pub(crate) fn record(&mut self, snapshot: JobSnapshot) {
        self.status = snapshot.status;
        self.result = snapshot.result;
    }
}

/// [`AsyncJobClient::run`](super::AsyncJobClient::run) 的成功结果
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job_id: String,
    pub artifact_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}
