//! Render callback interface.

use thiserror::Error;

use crate::binding::{BindingValue, TargetKey};

/// A render attempt failed. The binding stays dirty and is retried on the
/// next tick.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    /// The device or window behind the target is not available.
    #[error("Render target {0} is unavailable")]
    Unavailable(TargetKey),

    #[error("Render failed: {0}")]
    Failed(String),
}

/// Draws binding values. Implemented by presentation collaborators.
///
/// Called from the scheduler task; implementations must return promptly.
pub trait Renderer: Send + Sync {
    fn render(&self, target: TargetKey, value: &BindingValue) -> Result<(), RenderError>;
}

/// Renderer that logs each value instead of drawing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn render(&self, target: TargetKey, value: &BindingValue) -> Result<(), RenderError> {
        tracing::info!(binding = %target, value = %value, "Render");
        Ok(())
    }
}
