//! Command handlers invoked by the CLI.

pub mod bulk;

pub use bulk::{run_bulk_command, BulkCommand, BulkOutcome};
