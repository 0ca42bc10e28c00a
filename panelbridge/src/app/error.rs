//! Application error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::control::RegistryError;
use crate::dispatcher::DispatchError;
use crate::transport::TransportError;

/// Errors that can occur while starting a session.
#[derive(Debug, Error)]
pub enum AppError {
    /// No control catalog was configured or supplied.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load control definitions: {0}")]
    Registry(#[from] RegistryError),

    #[error("Failed to read bindings file {path}: {source}")]
    Bindings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to attach binding: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Failed to start stream receiver: {0}")]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config("no control definitions".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("no control definitions"));
    }

    #[test]
    fn test_app_error_from_registry_error() {
        let err: AppError = RegistryError::NotFound("AAP_EGIPWR".into()).into();
        assert!(matches!(err, AppError::Registry(_)));
        assert!(err.to_string().contains("AAP_EGIPWR"));
    }
}
