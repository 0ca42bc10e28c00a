//! Display refresh.
//!
//! Bindings marked dirty by the dispatcher are drawn by a single
//! [`RefreshScheduler`] task that multiplexes every registered [`Surface`].
//! The scheduler never blocks the dispatcher: it reads the latest published
//! value of each binding and clears the dirty flag with an atomic swap, so a
//! value published mid-render is picked up on the following pass.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tokio::sync::Notify;
//! use panelbridge::binding::{BindingState, BindingValue, DialPosition, SurfacePosition, TargetKey};
//! use panelbridge::refresh::{LogRenderer, RefreshConfig, RefreshScheduler, Surface};
//!
//! let surface = Arc::new(Surface::new("radio", Arc::new(LogRenderer)));
//! let state = Arc::new(BindingState::new(TargetKey::new(
//!     DialPosition::UpperCOM1,
//!     SurfacePosition::UpperActive,
//! )));
//! surface.add_binding(Arc::clone(&state));
//!
//! let scheduler = RefreshScheduler::new(RefreshConfig::default(), Arc::new(Notify::new()));
//! scheduler.register_surface(surface);
//!
//! state.publish(BindingValue::Integer(12150));
//! assert_eq!(scheduler.tick().rendered, 1);
//! assert!(!state.is_dirty());
//! ```

mod renderer;
mod scheduler;
mod surface;

pub use renderer::{LogRenderer, RenderError, Renderer};
pub use scheduler::{RefreshConfig, RefreshScheduler, RefreshStats, DEFAULT_REFRESH_INTERVAL};
pub use surface::Surface;
