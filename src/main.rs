use std::process::ExitCode;

use clap::Parser;
use sfbulk::cli::{self, output, Cli};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.debug);

    match cli::execute(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !cli.json {
                output::error(&e.reason());
            }
            ExitCode::from(e.exit_code())
        }
    }
}

/// Logs go to stderr so stdout stays clean for `--json`.
/// `RUST_LOG`, when set, overrides the `-d` count.
fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .with_thread_names(false);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    tracing::debug!("Log level: {}", level);
}
