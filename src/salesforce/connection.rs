//! Authenticated org connection supplied by the caller.

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "60.0";

// ─────────────────────────────────────────────────────────────────────────────
// Connection
// ─────────────────────────────────────────────────────────────────────────────

/// Everything needed to address an org: where it lives, which API version to
/// speak, and the bearer token to present.
///
/// This tool never logs in or refreshes. The token is obtained elsewhere
/// (e.g. `sf org display`) and handed in as-is. It is wrapped in
/// `SecretString` so it cannot leak through `Debug` or logging.
#[derive(Clone)]
pub struct Connection {
    /// Instance URL (e.g., "https://na1.salesforce.com")
    pub instance_url: String,
    /// API version, with or without a leading `v` (e.g., "60.0" or "v60.0")
    pub api_version: String,
    /// OAuth access token / session id
    pub access_token: SecretString,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("instance_url", &self.instance_url)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl Connection {
    pub fn new(
        instance_url: impl Into<String>,
        api_version: impl Into<String>,
        access_token: SecretString,
    ) -> Self {
        Self {
            instance_url: instance_url.into(),
            api_version: api_version.into(),
            access_token,
        }
    }

    /// The API version without any leading `v`, e.g. `"60.0"`.
    pub fn api_version_number(&self) -> &str {
        let trimmed = self.api_version.trim();
        trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed)
    }

    /// Builds the Tooling API bulk query endpoint:
    /// `{instance}/services/data/v{version}/tooling/jobs/query`
    ///
    /// Any path on the instance URL is kept as a prefix.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidConfig` if the instance URL or API version
    /// is missing or unparseable.
    pub fn tooling_jobs_url(&self) -> Result<Url, AppError> {
        let instance_url = self.instance_url.trim();
        if instance_url.is_empty() {
            return Err(AppError::InvalidConfig("instance URL is empty".to_string()));
        }

        let version = self.api_version_number();
        if version.is_empty() {
            return Err(AppError::InvalidConfig("API version is empty".to_string()));
        }

        let mut url = Url::parse(instance_url).map_err(|e| {
            AppError::InvalidConfig(format!("instance URL '{}' is invalid: {}", instance_url, e))
        })?;
        url.set_query(None);
        url.set_fragment(None);

        let version_segment = format!("v{}", version);
        url.path_segments_mut()
            .map_err(|_| {
                AppError::InvalidConfig(format!(
                    "instance URL '{}' cannot be used as a base URL",
                    instance_url
                ))
            })?
            .pop_if_empty()
            .extend([
                "services",
                "data",
                version_segment.as_str(),
                "tooling",
                "jobs",
                "query",
            ]);

        Ok(url)
    }

    /// Value for the `Authorization` header.
    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
