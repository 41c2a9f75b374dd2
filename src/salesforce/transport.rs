//! Single-shot HTTP transport with safe logging.
//!
//! One call to [`HttpTransport::send`] is exactly one request on the wire.
//! There is no retry, no token refresh, no overall deadline and no redirect
//! handling beyond the `reqwest` defaults.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// User agent string for all requests.
const CLIENT_USER_AGENT: &str = concat!("sfbulk/", env!("CARGO_PKG_VERSION"));

/// Connection establishment timeout in seconds. Transfers themselves are
/// unbounded so large result downloads can finish.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Boxed future returned by transport implementations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ─────────────────────────────────────────────────────────────────────────────
// Request / Response
// ─────────────────────────────────────────────────────────────────────────────

/// A fully specified outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// A received response with its body already read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Numeric status code.
    pub status: u16,
    /// Reason phrase for the status (empty if the code has none).
    pub status_text: String,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: reason_phrase(status),
            body: body.into(),
        }
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            AppError::RemoteOperationFailure(format!("Failed to parse response body: {}", e))
        })
    }

    /// Decodes the body as UTF-8 text, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Canonical reason phrase for a status code, or `""` for unknown codes.
pub fn reason_phrase(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
        .to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// HttpTransport
// ─────────────────────────────────────────────────────────────────────────────

/// Performs exactly one network call per `send`.
///
/// Transport-level failures are returned as
/// `AppError::RemoteOperationFailure`. Any status code, including errors, is
/// a successful `send`; interpreting it is the caller's job.
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, AppError>>;
}

/// `reqwest`-backed transport.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns `AppError::InvalidConfig` if the HTTP client fails to initialize.
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {
            http: build_http_client()?,
        })
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, AppError> {
        let start = Instant::now();
        let method = request.method.clone();
        // Path only: never the host, query or fragment.
        let logged_path = request.url.path().to_string();

        let mut builder = self
            .http
            .request(request.method, request.url.as_str())
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let duration_ms = start.elapsed().as_millis();
                info!("[SFDC] {} {} FAILED {}ms", method, logged_path, duration_ms);
                let e = e.without_url();
                debug!("[SFDC] transport error: {}", e);
                return Err(AppError::RemoteOperationFailure(format!(
                    "Connection to Salesforce failed: {}",
                    e
                )));
            }
        };

        let status = response.status();
        let x_request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        let body = response.bytes().await.map_err(|e| {
            AppError::RemoteOperationFailure(format!(
                "Failed to read response body: {}",
                e.without_url()
            ))
        })?;

        info!(
            "[SFDC] {} {} {} {}ms {}",
            method,
            logged_path,
            status.as_u16(),
            start.elapsed().as_millis(),
            x_request_id
        );

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body: body.to_vec(),
        })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, AppError>> {
        Box::pin(self.execute(request))
    }
}

/// Builds the configured HTTP client.
fn build_http_client() -> Result<reqwest::Client, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

    reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()
        .map_err(|e| AppError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn build_http_client_succeeds() {
        assert!(build_http_client().is_ok());
    }

    #[test]
    fn reason_phrase_known_and_unknown() {
        assert_eq!(reason_phrase(200), "OK");
        assert_eq!(reason_phrase(404), "Not Found");
        assert_eq!(reason_phrase(599), "");
    }

    #[test]
    fn response_json_reports_parse_failure() {
        let response = HttpResponse::new(200, "not json");

        let result: Result<serde_json::Value, _> = response.json();

        match result {
            Err(AppError::RemoteOperationFailure(msg)) => {
                assert!(msg.starts_with("Failed to parse response body"));
            }
            other => panic!("Expected RemoteOperationFailure, got: {:?}", other),
        }
    }

    #[test]
    fn response_text_is_lossy_utf8() {
        let response = HttpResponse::new(200, vec![b'a', 0xFF, b'b']);
        assert_eq!(response.text(), "a\u{FFFD}b");
    }

    #[tokio::test]
    async fn send_passes_method_headers_and_body_through() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("X-Test", "1"))
            .and(body_string("payload"))
            .respond_with(ResponseTemplate::new(201).set_body_string("created"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let url = Url::parse(&format!("{}/echo", mock_server.uri())).unwrap();
        let request = HttpRequest::new(Method::POST, url)
            .header(
                HeaderName::from_static("x-test"),
                HeaderValue::from_static("1"),
            )
            .body(b"payload".to_vec());

        let response = transport.send(request).await.unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.status_text, "Created");
        assert_eq!(response.text(), "created");
    }

    #[tokio::test]
    async fn send_waits_for_slow_responses() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("Id\n1\n")
                    .set_delay(Duration::from_secs(2)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let url = Url::parse(&format!("{}/slow", mock_server.uri())).unwrap();

        let response = transport
            .send(HttpRequest::new(Method::GET, url))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"Id\n1\n");
    }

    #[tokio::test]
    async fn send_returns_error_statuses_as_responses() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let url = Url::parse(&mock_server.uri()).unwrap();

        let response = transport
            .send(HttpRequest::new(Method::GET, url))
            .await
            .unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(response.status_text, "Service Unavailable");
    }

    #[tokio::test]
    async fn send_maps_connection_errors() {
        // Nothing listens on port 1.
        let uri = "http://127.0.0.1:1/".to_string();

        let transport = ReqwestTransport::new().unwrap();
        let url = Url::parse(&uri).unwrap();

        let result = transport.send(HttpRequest::new(Method::GET, url)).await;

        match result {
            Err(AppError::RemoteOperationFailure(msg)) => {
                assert!(msg.starts_with("Connection to Salesforce failed"));
                assert!(!msg.contains(&uri));
            }
            other => panic!("Expected RemoteOperationFailure, got: {:?}", other),
        }
    }
}
