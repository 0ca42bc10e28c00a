//! Shared setup for commands that run a session or load data.

use std::path::{Path, PathBuf};

use panelbridge::config::ConfigFile;
use panelbridge::control::{loader, ControlRegistry};
use panelbridge::logging::{self, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Loads configuration and installs logging for one CLI invocation.
pub struct CliRunner {
    config: ConfigFile,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Load the config (default path unless `path` is given) and start
    /// logging. `log_level` overrides the configured level.
    pub fn new(path: Option<&Path>, log_level: Option<&str>) -> Result<Self, CliError> {
        let mut config = match path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };
        if let Some(level) = log_level {
            config.logging.level = level.to_string();
        }

        let guard = logging::init(&config.logging)?;
        Ok(Self {
            config,
            _logging: guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConfigFile {
        &mut self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = panelbridge::VERSION,
            command,
            "PanelBridge starting"
        );
    }

    /// Load the control catalog: CLI paths first, then the configured ones.
    pub fn load_registry(&self, cli_definitions: &[PathBuf]) -> Result<ControlRegistry, CliError> {
        let definitions = resolve_definitions(cli_definitions, &self.config)?;
        Ok(loader::load_from_paths(&definitions)?)
    }
}

/// CLI definitions take precedence over the config file.
pub fn resolve_definitions(
    cli_definitions: &[PathBuf],
    config: &ConfigFile,
) -> Result<Vec<PathBuf>, CliError> {
    let definitions = if cli_definitions.is_empty() {
        config.controls.definitions.clone()
    } else {
        cli_definitions.to_vec()
    };

    if definitions.is_empty() {
        return Err(CliError::Config(
            "No control definitions. Set controls.definitions in config.ini \
             or use --definitions."
                .to_string(),
        ));
    }
    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definitions_take_precedence() {
        let config = ConfigFile::default().with_definitions(vec![PathBuf::from("config.json")]);
        let resolved = resolve_definitions(&[PathBuf::from("cli.json")], &config).unwrap();
        assert_eq!(resolved, vec![PathBuf::from("cli.json")]);
    }

    #[test]
    fn test_config_definitions_used_by_default() {
        let config = ConfigFile::default().with_definitions(vec![PathBuf::from("config.json")]);
        let resolved = resolve_definitions(&[], &config).unwrap();
        assert_eq!(resolved, vec![PathBuf::from("config.json")]);
    }

    #[test]
    fn test_missing_definitions() {
        let result = resolve_definitions(&[], &ConfigFile::default());
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
