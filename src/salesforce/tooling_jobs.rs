//! Tooling API bulk query job client.
//!
//! This module provides functionality to:
//! - Submit a bulk query job from SOQL
//! - Report the current state of a job
//! - Download a job's CSV results and write them to a file
//!
//! Each call issues exactly one request. Polling a job until it completes is
//! left to the caller.
//!
//! # Security
//!
//! - Raw SOQL queries are never logged
//! - Auth headers and tokens are never logged
//! - Job ids are truncated in logs

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use url::Url;

use crate::error::AppError;
use crate::output::{write_results, FileFormat, WrittenFile};
use crate::progress::ProgressObserver;
use crate::salesforce::connection::Connection;
use crate::salesforce::transport::{HttpRequest, HttpResponse, HttpTransport};

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// Server-side state of a bulk query job.
///
/// Unrecognised states are kept verbatim in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    UploadComplete,
    InProgress,
    JobComplete,
    Aborted,
    Failed,
    Unknown(String),
}

impl JobState {
    pub fn as_str(&self) -> &str {
        match self {
            JobState::UploadComplete => "UploadComplete",
            JobState::InProgress => "InProgress",
            JobState::JobComplete => "JobComplete",
            JobState::Aborted => "Aborted",
            JobState::Failed => "Failed",
            JobState::Unknown(raw) => raw,
        }
    }

    /// True once the job will not change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::JobComplete | JobState::Aborted | JobState::Failed
        )
    }
}

impl Default for JobState {
    fn default() -> Self {
        JobState::Unknown(String::new())
    }
}

impl From<String> for JobState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "UploadComplete" => JobState::UploadComplete,
            "InProgress" => JobState::InProgress,
            "JobComplete" => JobState::JobComplete,
            "Aborted" => JobState::Aborted,
            "Failed" => JobState::Failed,
            _ => JobState::Unknown(raw),
        }
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job object returned by the submit and status endpoints.
///
/// Fields this tool does not interpret are kept in `extra` so the JSON
/// output mirrors what the server sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolingJobInfo {
    /// Unique identifier for the job.
    pub id: String,
    /// Current state of the job.
    #[serde(default)]
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_records_processed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Wire Types
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for submitting a query job.
#[derive(Debug, Serialize)]
struct SubmitQueryRequest<'a> {
    operation: &'static str,
    query: &'a str,
}

/// Salesforce API error response format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalesforceError {
    message: String,
    error_code: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// ToolingJobClient
// ─────────────────────────────────────────────────────────────────────────────

/// Client for Tooling API bulk query jobs.
pub struct ToolingJobClient<T: HttpTransport> {
    transport: T,
    connection: Connection,
    /// `{instance}/services/data/v{version}/tooling/jobs/query`
    endpoint: Url,
    progress: Arc<dyn ProgressObserver>,
}

impl<T: HttpTransport> ToolingJobClient<T> {
    /// Creates a client for the given org connection.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidConfig` if the connection's instance URL or
    /// API version cannot form a valid endpoint.
    pub fn new(
        transport: T,
        connection: Connection,
        progress: Arc<dyn ProgressObserver>,
    ) -> Result<Self, AppError> {
        let endpoint = connection.tooling_jobs_url()?;
        // Fail on a token that cannot be a header value before any request.
        HeaderValue::from_str(&connection.bearer()).map_err(|_| {
            AppError::InvalidConfig("access token contains invalid characters".to_string())
        })?;

        Ok(Self {
            transport,
            connection,
            endpoint,
            progress,
        })
    }

    /// The base jobs endpoint this client talks to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Submits a new bulk query job.
    ///
    /// Every call creates a new job, even for an identical query.
    ///
    /// # Errors
    ///
    /// - `AppError::RemoteOperationFailure` - non-200 response, network
    ///   error, or an unparseable job object
    pub async fn submit_query(&self, query: &str) -> Result<ToolingJobInfo, AppError> {
        self.progress.start("Submitting bulk query job");
        let outcome = self.submit_query_inner(query).await;
        self.progress.stop();

        let job = outcome.inspect_err(|e| error!("[BULK] Job submission failed: {}", e))?;
        self.progress
            .message(&format!("query submitted with JobId {}", job.id));
        Ok(job)
    }

    async fn submit_query_inner(&self, query: &str) -> Result<ToolingJobInfo, AppError> {
        let body = serde_json::to_vec(&SubmitQueryRequest {
            operation: "query",
            query,
        })
        .map_err(|e| {
            AppError::RemoteOperationFailure(format!("Failed to encode request body: {}", e))
        })?;

        info!("[BULK] POST /tooling/jobs/query (submitting job)");

        let request = self
            .request(Method::POST, self.endpoint.clone())?
            .body(body);
        let response = self.execute(request).await?;
        let job: ToolingJobInfo = response.json()?;

        info!("[BULK] Submitted job {}", redact_id(&job.id));
        Ok(job)
    }

    /// Reports the current state of a job.
    ///
    /// A job in state `Failed` is still a successful call; the state is
    /// simply reported.
    pub async fn get_status(&self, job_id: &str) -> Result<ToolingJobInfo, AppError> {
        self.progress.start("Querying bulk query job");
        let outcome = self.get_status_inner(job_id).await;
        self.progress.stop();

        let job = outcome.inspect_err(|e| error!("[BULK] Job status check failed: {}", e))?;
        self.progress.message(&format!(
            "JobId {} current state is {}",
            job.id, job.state
        ));
        Ok(job)
    }

    async fn get_status_inner(&self, job_id: &str) -> Result<ToolingJobInfo, AppError> {
        info!("[BULK] GET /tooling/jobs/query/{} (status)", redact_id(job_id));

        let request = self.request(Method::GET, self.job_url(job_id)?)?;
        let response = self.execute(request).await?;
        let job: ToolingJobInfo = response.json()?;

        if let Some(message) = job.error_message.as_deref() {
            warn!("[BULK] Job {} reports: {}", redact_id(job_id), message);
        }
        Ok(job)
    }

    /// Downloads a job's results and writes them to
    /// `{output_dir}/{file_name}.{format}`.
    ///
    /// Nothing is written unless the download succeeded, and this returns
    /// only after the file is on disk.
    pub async fn fetch_results(
        &self,
        job_id: &str,
        output_dir: &Path,
        format: FileFormat,
        file_name: &str,
    ) -> Result<WrittenFile, AppError> {
        self.progress.start("Fetching bulk query job results");
        let outcome = self
            .fetch_results_inner(job_id, output_dir, format, file_name)
            .await;
        self.progress.stop();

        let written =
            outcome.inspect_err(|e| error!("[BULK] Results retrieval failed: {}", e))?;
        self.progress.message("results retrieved successfully");
        Ok(written)
    }

    async fn fetch_results_inner(
        &self,
        job_id: &str,
        output_dir: &Path,
        format: FileFormat,
        file_name: &str,
    ) -> Result<WrittenFile, AppError> {
        info!("[BULK] GET /tooling/jobs/query/{}/results", redact_id(job_id));

        let request = self.request(Method::GET, self.results_url(job_id)?)?;
        let response = self.execute(request).await?;
        let payload = response.body;

        info!(
            "[BULK] Downloaded results for job {} ({} bytes)",
            redact_id(job_id),
            payload.len()
        );

        write_results(
            payload,
            output_dir.to_path_buf(),
            file_name.to_string(),
            format,
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request Building
    // ─────────────────────────────────────────────────────────────────────────

    /// Builds a request carrying the standard JSON and bearer headers.
    fn request(&self, method: Method, url: Url) -> Result<HttpRequest, AppError> {
        let mut authorization = HeaderValue::from_str(&self.connection.bearer()).map_err(|_| {
            AppError::InvalidConfig("access token contains invalid characters".to_string())
        })?;
        authorization.set_sensitive(true);

        Ok(HttpRequest::new(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(AUTHORIZATION, authorization)
            .header(ACCEPT, HeaderValue::from_static("application/json")))
    }

    /// Builds a specific job URL: `{endpoint}/{job_id}`
    fn job_url(&self, job_id: &str) -> Result<Url, AppError> {
        self.endpoint_with(&[job_id])
    }

    /// Builds the results URL: `{endpoint}/{job_id}/results`
    fn results_url(&self, job_id: &str) -> Result<Url, AppError> {
        self.endpoint_with(&[job_id, "results"])
    }

    fn endpoint_with(&self, segments: &[&str]) -> Result<Url, AppError> {
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(AppError::RemoteOperationFailure(
                "Job id must not be empty".to_string(),
            ));
        }

        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::InvalidConfig("Failed to build job URL".to_string()))?
            .extend(segments);
        Ok(url)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Error Handling
    // ─────────────────────────────────────────────────────────────────────────

    /// Sends the request; anything but 200 becomes a failure.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, AppError> {
        let response = self.transport.send(request).await?;

        if response.status == 200 {
            return Ok(response);
        }

        log_salesforce_error(&response);
        Err(AppError::from_status(response.status, &response.status_text))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helper Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Logs the first Salesforce error in the body, if it has the usual shape.
fn log_salesforce_error(response: &HttpResponse) {
    if let Ok(errors) = serde_json::from_slice::<Vec<SalesforceError>>(&response.body) {
        if let Some(first_error) = errors.first() {
            warn!(
                "[BULK] HTTP {} [{}] {}",
                response.status, first_error.error_code, first_error.message
            );
            return;
        }
    }
    warn!("[BULK] HTTP {} {}", response.status, response.status_text);
}

/// Redacts a job ID for logging (shows first 8 chars).
fn redact_id(id: &str) -> String {
    match id.char_indices().nth(8) {
        Some((end, _)) => format!("{}...", &id[..end]),
        None => id.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
