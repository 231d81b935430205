//! `logmetrics show` command handler

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use logmetrics_config::{Config, LogGroup, Settings};

use crate::cli::ShowArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `show` command.
///
/// Loads the configuration and displays the compiled model, with defaults
/// applied and extended regexes flattened.
///
/// # Errors
///
/// Returns `CliError::Config` if compilation fails or `CliError::Command`
/// if the requested group does not exist.
pub async fn execute(
    args: ShowArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(config_path).await?;
    let report = ShowReport::build(&config, config_path, args.group.as_deref())?;

    writer.render(&report)?;

    Ok(())
}

/// Serializable view of the compiled configuration.
#[derive(Serialize)]
pub struct ConfigView<'a> {
    /// Global settings (None when a single group is selected)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<&'a Settings>,
    /// Selected log groups
    pub log_groups: BTreeMap<&'a str, &'a LogGroup>,
}

/// Compiled configuration display report.
///
/// The `yaml` field is only used for text rendering.
#[derive(Serialize)]
pub struct ShowReport<'a> {
    /// Configuration file path
    pub source: String,
    /// Selected group (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(flatten)]
    pub view: ConfigView<'a>,
    #[serde(skip)]
    pub yaml: String,
}

impl<'a> ShowReport<'a> {
    pub fn build(
        config: &'a Config,
        config_path: &Path,
        group: Option<&str>,
    ) -> Result<Self, CliError> {
        let view = match group {
            Some(name) => {
                let (key, lg) = config.log_groups.get_key_value(name).ok_or_else(|| {
                    CliError::Command(format!(
                        "unknown log group: {} (expected one of: {})",
                        name,
                        config.group_names().collect::<Vec<_>>().join(", ")
                    ))
                })?;
                ConfigView {
                    settings: None,
                    log_groups: BTreeMap::from([(key.as_str(), lg)]),
                }
            }
            None => ConfigView {
                settings: Some(&config.settings),
                log_groups: config
                    .log_groups
                    .iter()
                    .map(|(name, lg)| (name.as_str(), lg))
                    .collect(),
            },
        };

        let yaml = serde_yaml::to_string(&view)?;

        Ok(Self {
            source: config_path.display().to_string(),
            group: group.map(str::to_owned),
            view,
            yaml,
        })
    }
}

impl Render for ShowReport<'_> {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref group) = self.group {
            let label = format!("[{}]", group);
            writeln!(
                w,
                "Compiled configuration {} (source: {})",
                label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Compiled configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.yaml)?;

        Ok(())
    }
}
