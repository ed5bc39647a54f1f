use std::time::Duration;

use anyhow::Result as AnyResult;
use imagegen::jobs::{AsyncJob, JobClientConfig};
use imagegen::{AsyncJobClient, HttpJobProvider, ImageGenError, JobProvider, JobStatus};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> AnyResult<HttpJobProvider> {
    Ok(HttpJobProvider::new(format!("{}/v1/get_result", server.uri()))?)
}

#[tokio::test]
async fn submit_returns_provider_id() -> AnyResult<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/flux-pro"))
        .and(header("x-key", "secret-key"))
        .and(body_json(json!({ "prompt": "cat" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "abc",
            "polling_url": "ignored"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = provider(&server)?
        .submit(
            &format!("{}/v1/flux-pro", server.uri()),
            "secret-key",
            &json!({ "prompt": "cat" }),
        )
        .await?;
    assert_eq!(id, "abc");
    Ok(())
}

#[tokio::test]
async fn submit_failure_is_not_retried() -> AnyResult<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(402).set_body_string("insufficient credits"))
        .expect(1)
        .mount(&server)
        .await;

    let client = AsyncJobClient::from_provider(provider(&server)?);
    let err = client
        .run(
            &format!("{}/v1/flux-pro", server.uri()),
            "k",
            &json!({}),
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        ImageGenError::ProviderSubmitError { status, body } => {
            assert_eq!(status, 402);
            assert_eq!(body, "insufficient credits");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn poll_reads_status_and_result() -> AnyResult<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/get_result"))
        .and(query_param("id", "abc"))
        .and(header("x-key", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "abc",
            "status": "Ready",
            "result": { "sample": "https://cdn.example.com/abc.jpg", "seed": 42 }
        })))
        .mount(&server)
        .await;

    let snapshot = provider(&server)?.poll("abc", "k").await?;
    assert_eq!(snapshot.status, JobStatus::Ready);
    let result = snapshot.result.unwrap();
    assert_eq!(result.artifact_ref.as_deref(), Some("https://cdn.example.com/abc.jpg"));
    assert_eq!(result.seed, Some(42));
    Ok(())
}

#[tokio::test]
async fn poll_http_error_carries_status_and_body() -> AnyResult<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let client = AsyncJobClient::from_provider(provider(&server)?);
    let mut job = AsyncJob::new("abc");
    let err = client
        .wait_for_result(&mut job, "k", Duration::from_secs(5), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ImageGenError::ProviderPollError { ref job_id, status: 503, ref body }
            if job_id == "abc" && body == "busy"
    ));
    Ok(())
}

#[tokio::test]
async fn run_end_to_end_with_custom_header() -> AnyResult<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(header("authorization-key", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "job-1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/get_result"))
        .and(query_param("id", "job-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "job-1", "status": "Pending" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/get_result"))
        .and(query_param("id", "job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "job-1",
            "status": "Ready",
            "result": { "artifactRef": "https://cdn.example.com/job-1.png" }
        })))
        .mount(&server)
        .await;

    let http = provider(&server)?.with_credential_header("authorization-key");
    let client = AsyncJobClient::with_config(
        std::sync::Arc::new(http),
        JobClientConfig {
            poll_interval: Duration::from_millis(20),
            timeout: Duration::from_secs(5),
        },
    );

    let outcome = client
        .run(
            &format!("{}/submit", server.uri()),
            "k",
            &json!({ "prompt": "dog" }),
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await?;

    assert_eq!(outcome.job_id, "job-1");
    assert_eq!(outcome.artifact_ref, "https://cdn.example.com/job-1.png");
    assert_eq!(outcome.seed, None);

    let polls = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == "GET")
        .count();
    assert_eq!(polls, 2);
    Ok(())
}
