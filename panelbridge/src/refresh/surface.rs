//! Presentation surfaces.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::renderer::Renderer;
use crate::binding::BindingState;

/// A display that owns a group of bindings and the renderer that draws them.
pub struct Surface {
    name: String,
    visible: AtomicBool,
    bindings: Mutex<Vec<Arc<BindingState>>>,
    renderer: Arc<dyn Renderer>,
}

impl Surface {
    /// A visible surface with no bindings.
    pub fn new(name: impl Into<String>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            name: name.into(),
            visible: AtomicBool::new(true),
            bindings: Mutex::new(Vec::new()),
            renderer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_binding(&self, state: Arc<BindingState>) {
        self.bindings.lock().push(state);
    }

    pub fn bindings(&self) -> Vec<Arc<BindingState>> {
        self.bindings.lock().clone()
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    /// Show or hide the surface.
    ///
    /// A surface that becomes visible re-marks every binding holding a value
    /// so the next tick redraws it.
    pub fn set_visible(&self, visible: bool) {
        let was_visible = self.visible.swap(visible, Ordering::AcqRel);
        if visible && !was_visible {
            let bindings = self.bindings.lock();
            for state in bindings.iter().filter(|s| s.has_value()) {
                state.mark_dirty();
            }
            debug!(surface = %self.name, bindings = bindings.len(), "Surface shown");
        } else if !visible && was_visible {
            debug!(surface = %self.name, "Surface hidden");
        }
    }

    /// Detach every binding. The dispatcher stops publishing to them.
    pub fn teardown(&self) {
        let bindings = std::mem::take(&mut *self.bindings.lock());
        for state in &bindings {
            state.detach();
        }
        debug!(surface = %self.name, bindings = bindings.len(), "Surface torn down");
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("name", &self.name)
            .field("visible", &self.is_visible())
            .field("bindings", &self.bindings.lock().len())
            .finish()
    }
}
