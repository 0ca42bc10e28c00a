//! CLI error type.

use std::fmt;

use panelbridge::app::AppError;
use panelbridge::config::ConfigError;
use panelbridge::control::RegistryError;
use panelbridge::formula::FormulaError;
use panelbridge::logging::LoggingError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration problem (bad key, missing setting, signal handler).
    Config(String),

    /// Logging could not be initialised.
    Logging(LoggingError),

    /// Control catalog could not be loaded.
    Registry(RegistryError),

    /// Expression failed to parse or evaluate.
    Formula(FormulaError),

    /// Binding file could not be read or contained invalid lines.
    Bindings(String),

    /// The session failed to start.
    App(AppError),

    /// Failed to create the Tokio runtime.
    Runtime(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
            CliError::Registry(e) => write!(f, "Control catalog error: {}", e),
            CliError::Formula(e) => write!(f, "Formula error: {}", e),
            CliError::Bindings(msg) => write!(f, "Bindings error: {}", msg),
            CliError::App(e) => write!(f, "{}", e),
            CliError::Runtime(e) => write!(f, "Failed to create Tokio runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Logging(e) => Some(e),
            CliError::Registry(e) => Some(e),
            CliError::Formula(e) => Some(e),
            CliError::App(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Config(_) | CliError::Bindings(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        CliError::Registry(e)
    }
}

impl From<FormulaError> for CliError {
    fn from(e: FormulaError) -> Self {
        CliError::Formula(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = CliError::Config("no definitions".to_string());
        assert_eq!(err.to_string(), "Configuration error: no definitions");
    }

    #[test]
    fn test_from_registry_error() {
        let err: CliError = RegistryError::NotFound("UHF_FREQ".into()).into();
        assert!(matches!(err, CliError::Registry(_)));
        assert!(err.to_string().contains("UHF_FREQ"));
    }
}
