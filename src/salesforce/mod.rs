//! Salesforce Tooling API access.
//!
//! - **Connection**: instance URL, API version and bearer token supplied by the caller
//! - **Transport**: one request per call, with logging that never leaks tokens
//! - **Tooling jobs**: submit, status and results for bulk query jobs

pub mod connection;
pub mod tooling_jobs;
pub mod transport;

pub use connection::{Connection, DEFAULT_API_VERSION};
pub use tooling_jobs::{JobState, ToolingJobClient, ToolingJobInfo};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
