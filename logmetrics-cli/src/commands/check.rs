//! `logmetrics check` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use logmetrics_config::{Config, LogMetricsError};

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `check` command.
///
/// Compiles the configuration file, renders a validation report, and
/// returns the compile error so that `main` exits non-zero.
///
/// # Errors
///
/// Returns `CliError::Config` carrying the first violation found.
pub async fn execute(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "checking configuration");

    let result = Config::load(config_path).await;
    let report = CheckReport::from_result(config_path, &result);

    writer.render(&report)?;

    result.map(|_| ()).map_err(CliError::from)
}

/// Configuration check report.
#[derive(Serialize)]
pub struct CheckReport {
    /// Configuration file path
    pub source: String,
    /// Whether the configuration compiled
    pub valid: bool,
    /// Number of compiled log groups
    pub groups: usize,
    /// First violation (None if valid)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckReport {
    pub fn from_result(config_path: &Path, result: &Result<Config, LogMetricsError>) -> Self {
        let source = config_path.display().to_string();
        match result {
            Ok(config) => Self {
                source,
                valid: true,
                groups: config.log_groups.len(),
                error: None,
            },
            Err(e) => Self {
                source,
                valid: false,
                groups: 0,
                error: Some(e.to_string()),
            },
        }
    }
}

impl Render for CheckReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Check: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
            writeln!(w, "  Log groups: {}", self.groups)?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            if let Some(ref err) = self.error {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}
