//! Generation job client: submit, poll, download, mock fallback.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

use reel_models::ClipStatus;

use crate::error::{GenAiError, GenAiResult};
use crate::types::{ClipOutcome, GenerationJob, JobState, ResultResponse, StatusResponse, SubmitResponse};

/// Placeholder bytes written for mock artifacts. Non-empty so that
/// downstream integrity checks see a structurally valid file.
const MOCK_ARTIFACT: &[u8] = &[0x4d; 1024];

/// Configuration for the generation job client.
#[derive(Debug, Clone)]
pub struct GenerationClientConfig {
    /// Base URL of the generation service
    pub base_url: String,
    /// API key; absent means the client runs in mock mode
    pub api_key: Option<String>,
    /// Interval between status polls
    pub poll_interval: Duration,
    /// Maximum number of status polls before declaring failure
    pub max_poll_attempts: u32,
    /// Overall per-job timeout
    pub job_timeout: Duration,
    /// Max retries on the submit call
    pub max_submit_retries: u32,
}

impl Default for GenerationClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://queue.genvid.example.com".to_string(),
            api_key: None,
            poll_interval: Duration::from_secs(2),
            max_poll_attempts: 90,
            job_timeout: Duration::from_secs(300),
            max_submit_retries: 2,
        }
    }
}

impl GenerationClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("REEL_GEN_SERVICE_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("REEL_GEN_API_KEY").ok().filter(|k| !k.is_empty()),
            poll_interval: Duration::from_millis(
                std::env::var("REEL_GEN_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
            max_poll_attempts: std::env::var("REEL_GEN_MAX_POLLS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_poll_attempts),
            job_timeout: Duration::from_secs(
                std::env::var("REEL_GEN_JOB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            max_submit_retries: defaults.max_submit_retries,
        }
    }
}

/// Client for the asynchronous generation service.
pub struct GenerationClient {
    http: Client,
    config: GenerationClientConfig,
}

impl GenerationClient {
    /// Create a new client.
    pub fn new(config: GenerationClientConfig) -> GenAiResult<Self> {
        let http = Client::builder()
            .timeout(config.job_timeout)
            .build()
            .map_err(GenAiError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> GenAiResult<Self> {
        Self::new(GenerationClientConfig::from_env())
    }

    /// Whether real generation is possible (credentials configured).
    pub fn is_live(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Submit a job, poll it to completion and download the artifact
    /// into `dest`.
    ///
    /// This call never raises across the boundary: a failed or timed-out
    /// job yields a `failed` outcome with the captured error, and an
    /// entirely unreachable backend yields a `mock` placeholder artifact
    /// so downstream phases still see a structurally valid file.
    pub async fn submit_and_retrieve(&self, job: &GenerationJob, dest: &Path) -> ClipOutcome {
        if self.config.api_key.is_none() {
            warn!(model = %job.model, "Generation credentials missing, writing mock artifact");
            return self.mock_outcome(dest).await;
        }

        let attempt = tokio::time::timeout(self.config.job_timeout, self.run_job(job, dest)).await;

        match attempt {
            Ok(Ok(())) => ClipOutcome {
                status: ClipStatus::Success,
                file_path: Some(dest.to_path_buf()),
                error: None,
            },
            Ok(Err(e)) if e.is_unreachable() => {
                warn!(model = %job.model, error = %e, "Generation service unreachable, writing mock artifact");
                self.mock_outcome(dest).await
            }
            Ok(Err(e)) => {
                warn!(model = %job.model, error = %e, "Generation job failed");
                ClipOutcome::failed(e.to_string())
            }
            Err(_) => {
                warn!(model = %job.model, "Generation job timed out");
                ClipOutcome::failed(format!(
                    "job timed out after {} seconds",
                    self.config.job_timeout.as_secs()
                ))
            }
        }
    }

    /// Submit, poll and download one job.
    async fn run_job(&self, job: &GenerationJob, dest: &Path) -> GenAiResult<()> {
        let request_id = self.submit(job).await?;
        debug!(model = %job.model, request_id = %request_id, "Generation job submitted");

        let artifact_url = self.poll_until_complete(&request_id).await?;
        self.download(&artifact_url, dest).await?;

        info!(model = %job.model, dest = %dest.display(), "Generation artifact retrieved");
        Ok(())
    }

    /// Submit the job, retrying transient errors with backoff.
    async fn submit(&self, job: &GenerationJob) -> GenAiResult<String> {
        let url = format!("{}/generate/{}", self.config.base_url, job.model);
        let mut last_error = None;

        for attempt in 0..=self.config.max_submit_retries {
            let result = self.try_submit(&url, job).await;
            match result {
                Ok(id) => return Ok(id),
                Err(e) if e.is_retryable() && attempt < self.config.max_submit_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Submit failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| GenAiError::request_failed("submit failed")))
    }

    async fn try_submit(&self, url: &str, job: &GenerationJob) -> GenAiResult<String> {
        let response = self
            .http
            .post(url)
            .bearer_auth(self.config.api_key.as_deref().unwrap_or_default())
            .json(job)
            .send()
            .await
            .map_err(GenAiError::Network)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenAiError::request_failed(format!(
                "submit returned {}: {}",
                status, body
            )));
        }

        let submit: SubmitResponse = response
            .json()
            .await
            .map_err(|e| GenAiError::invalid_response(format!("submit payload: {}", e)))?;
        Ok(submit.request_id)
    }

    /// Poll status until the job completes, fails, or the poll budget
    /// is exhausted. A malformed status payload is re-fetched exactly
    /// once before the job is declared failed.
    async fn poll_until_complete(&self, request_id: &str) -> GenAiResult<String> {
        let status_url = format!("{}/requests/{}/status", self.config.base_url, request_id);
        let mut malformed_retried = false;

        for _ in 0..self.config.max_poll_attempts {
            match self.fetch_status(&status_url).await {
                Ok(status) => match status.state() {
                    Some(JobState::Completed) => return self.fetch_artifact_url(request_id).await,
                    Some(JobState::Failed) => {
                        return Err(GenAiError::job_failed(
                            status.error.unwrap_or_else(|| "job reported failed".to_string()),
                        ));
                    }
                    Some(JobState::Pending) => {}
                    None => {
                        if malformed_retried {
                            return Err(GenAiError::invalid_response(format!(
                                "unrecognized job status: {}",
                                status.status
                            )));
                        }
                        malformed_retried = true;
                        debug!(status = %status.status, "Unrecognized status payload, re-fetching once");
                        continue;
                    }
                },
                Err(e) if !malformed_retried && matches!(e, GenAiError::InvalidResponse(_)) => {
                    malformed_retried = true;
                    debug!(error = %e, "Malformed status payload, re-fetching once");
                    continue;
                }
                Err(e) => return Err(e),
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }

        Err(GenAiError::Timeout(
            (self.config.poll_interval.as_secs().max(1)) * u64::from(self.config.max_poll_attempts),
        ))
    }

    async fn fetch_status(&self, url: &str) -> GenAiResult<StatusResponse> {
        let response = self
            .http
            .get(url)
            .bearer_auth(self.config.api_key.as_deref().unwrap_or_default())
            .send()
            .await
            .map_err(GenAiError::Network)?;

        if !response.status().is_success() {
            return Err(GenAiError::request_failed(format!(
                "status check returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GenAiError::invalid_response(format!("status payload: {}", e)))
    }

    async fn fetch_artifact_url(&self, request_id: &str) -> GenAiResult<String> {
        let url = format!("{}/requests/{}", self.config.base_url, request_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.config.api_key.as_deref().unwrap_or_default())
            .send()
            .await
            .map_err(GenAiError::Network)?;

        if !response.status().is_success() {
            return Err(GenAiError::request_failed(format!(
                "result fetch returned {}",
                response.status()
            )));
        }

        let result: ResultResponse = response
            .json()
            .await
            .map_err(|e| GenAiError::invalid_response(format!("result payload: {}", e)))?;
        Ok(result.artifact_url)
    }

    async fn download(&self, url: &str, dest: &Path) -> GenAiResult<()> {
        let response = self.http.get(url).send().await.map_err(GenAiError::Network)?;

        if !response.status().is_success() {
            return Err(GenAiError::request_failed(format!(
                "artifact download returned {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await.map_err(GenAiError::Network)?;
        if bytes.is_empty() {
            return Err(GenAiError::invalid_response("downloaded artifact is empty"));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }

    /// Write a placeholder artifact and report a mock outcome.
    async fn mock_outcome(&self, dest: &Path) -> ClipOutcome {
        if let Some(parent) = dest.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return ClipOutcome::failed(format!("mock artifact dir: {}", e));
            }
        }
        match tokio::fs::write(dest, MOCK_ARTIFACT).await {
            Ok(()) => ClipOutcome {
                status: ClipStatus::Mock,
                file_path: Some(dest.to_path_buf()),
                error: None,
            },
            Err(e) => ClipOutcome::failed(format!("mock artifact write: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArtifactKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> GenerationClientConfig {
        GenerationClientConfig {
            base_url,
            api_key: Some("test-key".to_string()),
            poll_interval: Duration::from_millis(10),
            max_poll_attempts: 5,
            job_timeout: Duration::from_secs(10),
            max_submit_retries: 0,
        }
    }

    fn video_job() -> GenerationJob {
        GenerationJob::video("hailuo-02", "a runway walk", 10, "9:16")
    }

    #[tokio::test]
    async fn retrieves_artifact_on_completed_job() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate/hailuo-02"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"request_id": "req-1"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/requests/req-1/status"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "completed"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/requests/req-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"artifact_url": format!("{}/files/clip.mp4", server.uri())}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake mp4 bytes".to_vec()))
            .mount(&server)
            .await;

        let client = GenerationClient::new(test_config(server.uri())).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip_1.mp4");

        let outcome = client.submit_and_retrieve(&video_job(), &dest).await;

        assert_eq!(outcome.status, ClipStatus::Success);
        assert_eq!(outcome.file_path.as_deref(), Some(dest.as_path()));
        assert_eq!(std::fs::read(&dest).unwrap(), b"fake mp4 bytes");
    }

    #[tokio::test]
    async fn failed_status_yields_failed_outcome_not_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate/hailuo-02"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"request_id": "req-2"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/requests/req-2/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"status": "failed", "error": "content policy"}),
            ))
            .mount(&server)
            .await;

        let client = GenerationClient::new(test_config(server.uri())).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let outcome = client
            .submit_and_retrieve(&video_job(), &dir.path().join("clip.mp4"))
            .await;

        assert_eq!(outcome.status, ClipStatus::Failed);
        assert!(outcome.error.as_deref().unwrap().contains("content policy"));
        assert!(outcome.file_path.is_none());
    }

    #[tokio::test]
    async fn malformed_status_is_refetched_once_then_fails() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate/hailuo-02"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"request_id": "req-3"})),
            )
            .mount(&server)
            .await;
        // Always returns an unknown status; the client retries once and
        // then gives up rather than burning the whole poll budget
        Mock::given(method("GET"))
            .and(path("/requests/req-3/status"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "sideways"})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let client = GenerationClient::new(test_config(server.uri())).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let outcome = client
            .submit_and_retrieve(&video_job(), &dir.path().join("clip.mp4"))
            .await;

        assert_eq!(outcome.status, ClipStatus::Failed);
        assert!(outcome.error.as_deref().unwrap().contains("sideways"));
    }

    #[tokio::test]
    async fn poll_budget_exhaustion_yields_failed_outcome() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate/hailuo-02"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"request_id": "req-4"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/requests/req-4/status"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "in_progress"})),
            )
            .mount(&server)
            .await;

        let client = GenerationClient::new(test_config(server.uri())).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let outcome = client
            .submit_and_retrieve(&video_job(), &dir.path().join("clip.mp4"))
            .await;

        assert_eq!(outcome.status, ClipStatus::Failed);
    }

    #[tokio::test]
    async fn missing_credentials_writes_mock_artifact() {
        let mut config = test_config("http://localhost:1".to_string());
        config.api_key = None;

        let client = GenerationClient::new(config).unwrap();
        assert!(!client.is_live());

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("raw_clips").join("clip_1.mp4");
        let outcome = client.submit_and_retrieve(&video_job(), &dest).await;

        assert_eq!(outcome.status, ClipStatus::Mock);
        let metadata = std::fs::metadata(&dest).unwrap();
        assert!(metadata.len() > 0, "mock artifact must be non-empty");
    }

    #[tokio::test]
    async fn unreachable_backend_degrades_to_mock() {
        // Nothing is listening on this port: the submit connect error
        // must degrade to a mock artifact, not a failed clip
        let config = test_config("http://127.0.0.1:9".to_string());
        let client = GenerationClient::new(config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mp4");
        let outcome = client.submit_and_retrieve(&video_job(), &dest).await;

        assert_eq!(outcome.status, ClipStatus::Mock);
        assert!(dest.exists());
    }

    #[test]
    fn artifact_kinds_pick_extensions() {
        assert_eq!(ArtifactKind::Video.extension(), "mp4");
        assert_eq!(ArtifactKind::Audio.extension(), "wav");
    }
}
