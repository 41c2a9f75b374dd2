//! Result file output.
//!
//! Persists downloaded job results as CSV (verbatim) or JSON (converted),
//! always completing the write before reporting success.

mod materializer;

pub use materializer::{csv_to_json, write_results, write_results_blocking, FileFormat, WrittenFile};
