//! Tooling API bulk query jobs from the command line.
//!
//! Submit a SOQL query as an asynchronous job, check on its state, and
//! download the finished result set as CSV or JSON.

pub mod cli;
pub mod commands;
pub mod envelope;
pub mod error;
pub mod output;
pub mod progress;
pub mod salesforce;

pub use error::AppError;
