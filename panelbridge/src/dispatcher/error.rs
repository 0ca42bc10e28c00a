//! Dispatcher error types.

use thiserror::Error;

use crate::binding::TargetKey;
use crate::control::RegistryError;

/// Errors raised when subscribing to the dispatcher.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispatchError {
    /// The subscription names a control the registry does not know.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The binding has no dial or surface position.
    #[error("Binding has no display position")]
    Unplaced,

    /// The binding has no source.
    #[error("Binding for {0} has no source")]
    Unbound(TargetKey),
}
