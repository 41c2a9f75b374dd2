//! Command-line interface: argument parsing, dispatch and output.

pub mod args;
pub mod output;

use std::sync::Arc;

use crate::commands::{run_bulk_command, BulkOutcome};
use crate::envelope::CommandOutput;
use crate::error::AppError;
use crate::progress::{ProgressObserver, SilentProgress, SpinnerProgress};
use crate::salesforce::{ReqwestTransport, ToolingJobClient};

pub use args::{Cli, Commands};

/// Runs the parsed command line and prints its result.
///
/// With `--json` the `{"finalresponse": ...}` object is printed for
/// failures as well; the error is still returned so the caller can set the
/// exit code.
pub async fn execute(cli: &Cli) -> Result<(), AppError> {
    let result = run(cli).await;

    if cli.json {
        let rendered = serde_json::to_string_pretty(&CommandOutput::from(&result)).map_err(|e| {
            AppError::RemoteOperationFailure(format!("Failed to render JSON output: {}", e))
        })?;
        output::info(&rendered);
    } else if let Ok(outcome) = &result {
        if let Some(summary) = outcome.summary() {
            output::success(summary);
        }
    }

    result.map(|_| ())
}

async fn run(cli: &Cli) -> Result<BulkOutcome, AppError> {
    let connection = cli.connection()?;
    let progress: Arc<dyn ProgressObserver> = if cli.json {
        Arc::new(SilentProgress)
    } else {
        Arc::new(SpinnerProgress::new())
    };
    let client = ToolingJobClient::new(ReqwestTransport::new()?, connection, progress)?;

    match &cli.command {
        Commands::Bulk { command } => run_bulk_command(&client, command).await,
    }
}
