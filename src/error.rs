use thiserror::Error;

/// Patterns (lowercase) that indicate sensitive data not safe for terminal display.
/// Used by `contains_sensitive()` for case-insensitive matching.
pub(crate) const SENSITIVE_PATTERNS: &[&str] = &[
    "bearer ",
    "refresh_token",
    "access_token",
    "client_secret",
    "authorization:",
];

/// Returns true if the message contains any sensitive pattern (case-insensitive).
fn contains_sensitive(msg: &str) -> bool {
    let lower = msg.to_ascii_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Sanitizes a message for display.
/// If sensitive content is detected, returns the fallback instead.
fn sanitize_message(msg: &str, fallback: &str) -> String {
    if contains_sensitive(msg) {
        fallback.into()
    } else {
        msg.to_string()
    }
}

/// Exit code for a failed remote operation.
pub const EXIT_FAILURE: u8 = 1;

/// Exit code for bad configuration (sysexits `EX_CONFIG`).
pub const EXIT_CONFIG: u8 = 78;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Any failure while talking to the org or persisting what it returned.
    ///
    /// Carries the human-readable reason verbatim, e.g.
    /// `"Bad Request.The status code of response is 400"`.
    #[error("{0}")]
    RemoteOperationFailure(String),

    // ── Configuration ─────────────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AppError {
    /// Builds the failure reported for a non-200 response.
    pub fn from_status(status: u16, status_text: &str) -> Self {
        AppError::RemoteOperationFailure(format!(
            "{}.The status code of response is {}",
            status_text, status
        ))
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::RemoteOperationFailure(_) => EXIT_FAILURE,
            AppError::InvalidConfig(_) => EXIT_CONFIG,
        }
    }

    /// The reason string carried in a failure envelope.
    ///
    /// Never leaks bearer tokens or other credentials echoed back by the server.
    pub fn reason(&self) -> String {
        match self {
            AppError::RemoteOperationFailure(msg) => {
                sanitize_message(msg, "The remote operation failed.")
            }
            AppError::InvalidConfig(_) => self.to_string(),
        }
    }
}
