//! CLI-specific error types and exit code mapping

use logmetrics_config::LogMetricsError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or compilation failure.
    #[error("configuration error: {0}")]
    Config(#[from] LogMetricsError),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// YAML serialisation failed during output rendering.
    #[error("yaml output error: {0}")]
    YamlSerialize(#[from] serde_yaml::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                         |
    /// |------|---------------------------------|
    /// | 0    | Success                         |
    /// | 1    | General / command error         |
    /// | 2    | Configuration error             |
    /// | 10   | IO error (including config read)|
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(e) if e.is_config_error() => 2,
            Self::Config(_) | Self::Io(_) => 10,
            Self::Command(_) | Self::JsonSerialize(_) | Self::YamlSerialize(_) => 1,
        }
    }
}
