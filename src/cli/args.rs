//! CLI argument definitions using clap

use clap::{ArgAction, Parser, Subcommand};
use secrecy::SecretString;

use crate::commands::BulkCommand;
use crate::error::AppError;
use crate::salesforce::{Connection, DEFAULT_API_VERSION};

/// Submit Salesforce Tooling API bulk query jobs, check their state and download results
#[derive(Parser, Debug)]
#[command(name = "sfbulk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Org instance URL, e.g. https://mydomain.my.salesforce.com
    #[arg(long, env = "SF_INSTANCE_URL", global = true)]
    pub instance_url: Option<String>,

    /// Access token (session id) for the org
    #[arg(long, env = "SF_ACCESS_TOKEN", hide_env_values = true, global = true)]
    pub access_token: Option<String>,

    /// API version, e.g. 60.0
    #[arg(long, env = "SF_API_VERSION", default_value = DEFAULT_API_VERSION, global = true)]
    pub api_version: String,

    /// Print the result as JSON on stdout instead of status lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tooling API bulk query jobs
    Bulk {
        #[command(subcommand)]
        command: BulkCommand,
    },
}

impl Cli {
    /// Builds the org connection from flags / environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidConfig` if the instance URL or access token
    /// was not supplied.
    pub fn connection(&self) -> Result<Connection, AppError> {
        let instance_url = non_empty(self.instance_url.as_deref()).ok_or_else(|| {
            AppError::InvalidConfig(
                "no instance URL given (use --instance-url or SF_INSTANCE_URL)".to_string(),
            )
        })?;
        let access_token = non_empty(self.access_token.as_deref()).ok_or_else(|| {
            AppError::InvalidConfig(
                "no access token given (use --access-token or SF_ACCESS_TOKEN)".to_string(),
            )
        })?;

        Ok(Connection::new(
            instance_url,
            self.api_version.clone(),
            SecretString::from(access_token.to_string()),
        ))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
