//! logmetrics CLI -- configuration gate for the log-metrics pipeline.
//!
//! Any configuration error terminates the process with a non-zero exit code
//! after logging the first violation.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(cli.log_level.as_deref(), cli.log_format) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    tracing::debug!(config = %cli.config.display(), "logmetrics starting");

    let writer = OutputWriter::new(cli.output);
    let result = match cli.command {
        Commands::Check => commands::check::execute(&cli.config, &writer).await,
        Commands::Show(args) => commands::show::execute(args, &cli.config, &writer).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, exit_code = e.exit_code(), "logmetrics failed");
        std::process::exit(e.exit_code());
    }
}
