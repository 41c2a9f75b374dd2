//! `bulk` subcommands: submit a query job, report its state, fetch its results.

use std::path::PathBuf;

use clap::Subcommand;
use serde::Serialize;

use crate::error::AppError;
use crate::output::{FileFormat, WrittenFile};
use crate::salesforce::{HttpTransport, ToolingJobClient, ToolingJobInfo};

/// Default base name of the results file.
pub const DEFAULT_FILE_NAME: &str = "metadatadependency";

/// Default directory results are written to.
pub const DEFAULT_RETRIEVE_DIRECTORY: &str = "./";

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum BulkCommand {
    /// Submit a bulk query job
    ///
    /// Example:
    ///   sfbulk bulk query --query "SELECT MetadataComponentId, MetadataComponentName,
    ///   RefMetadataComponentName FROM MetadataComponentDependency
    ///   WHERE MetadataComponentType = 'ExperienceBundle'"
    Query {
        /// SOQL query to run
        #[arg(short, long)]
        query: String,
    },

    /// Report the current state of a bulk query job
    Report {
        /// Job id returned by `bulk query`
        #[arg(short = 'i', long)]
        jobid: String,
    },

    /// Download the results of a completed bulk query job
    #[command(name = "result")]
    Results {
        /// Job id returned by `bulk query`
        #[arg(short = 'i', long)]
        jobid: String,

        /// Output format: csv (as returned) or json (array of records)
        #[arg(short = 'f', long, default_value = "csv")]
        fileformat: FileFormat,

        /// Directory to write the results file to (created if missing)
        #[arg(short = 'r', long, default_value = DEFAULT_RETRIEVE_DIRECTORY)]
        retrievedirectory: PathBuf,

        /// Base name of the results file, without extension
        #[arg(short = 'n', long, default_value = DEFAULT_FILE_NAME)]
        filename: String,
    },
}

/// What a `bulk` subcommand produced; serialized as the envelope's `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BulkOutcome {
    Submitted(ToolingJobInfo),
    Status(ToolingJobInfo),
    Retrieved(WrittenFile),
}

impl BulkOutcome {
    /// Line printed after the command in human-readable mode, if any.
    pub fn summary(&self) -> Option<&str> {
        match self {
            BulkOutcome::Retrieved(written) => Some(&written.message),
            BulkOutcome::Submitted(_) | BulkOutcome::Status(_) => None,
        }
    }
}

/// Runs one `bulk` subcommand against the org.
pub async fn run_bulk_command<T: HttpTransport>(
    client: &ToolingJobClient<T>,
    command: &BulkCommand,
) -> Result<BulkOutcome, AppError> {
    match command {
        BulkCommand::Query { query } => client
            .submit_query(query)
            .await
            .map(BulkOutcome::Submitted),
        BulkCommand::Report { jobid } => {
            client.get_status(jobid).await.map(BulkOutcome::Status)
        }
        BulkCommand::Results {
            jobid,
            fileformat,
            retrievedirectory,
            filename,
        } => client
            .fetch_results(jobid, retrievedirectory, *fileformat, filename)
            .await
            .map(BulkOutcome::Retrieved),
    }
}
