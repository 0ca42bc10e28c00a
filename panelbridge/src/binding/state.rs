//! Live per-binding state shared between the dispatcher and the refresh
//! scheduler.
//!
//! The dispatcher is the only writer of the pending value and the only
//! producer of the clean → dirty transition. The scheduler consumes the
//! dirty flag with an atomic swap, so a value published while a render is in
//! flight is never lost: the swap either sees the new dirty flag or the
//! render that follows picks up the newer value.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::converter::ConverterList;
use super::position::TargetKey;
use crate::formula::FORMULA_ERROR_SENTINEL;
use crate::output::DecodedValue;

/// A value ready to be drawn at a render target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingValue {
    Integer(i64),
    Text(String),
    /// The formula has never evaluated successfully.
    EvaluationFailed,
}

impl BindingValue {
    /// Text the renderer should show.
    pub fn display_text(&self) -> String {
        match self {
            BindingValue::Integer(n) => n.to_string(),
            BindingValue::Text(s) => s.clone(),
            BindingValue::EvaluationFailed => FORMULA_ERROR_SENTINEL.to_string(),
        }
    }
}

impl From<&DecodedValue> for BindingValue {
    fn from(value: &DecodedValue) -> Self {
        match value {
            DecodedValue::Integer(n) => BindingValue::Integer(i64::from(*n)),
            DecodedValue::String(s) => BindingValue::Text(s.clone()),
        }
    }
}

impl fmt::Display for BindingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

/// A pending value and the generation it was published at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub value: BindingValue,
    pub generation: u64,
}

#[derive(Debug, Default)]
struct Pending {
    value: Option<BindingValue>,
    generation: u64,
}

/// Dirty flag and cached values for one attached binding.
#[derive(Debug)]
pub struct BindingState {
    target: TargetKey,
    converters: ConverterList,
    dirty: AtomicBool,
    detached: AtomicBool,
    pending: Mutex<Pending>,
    rendered: Mutex<Option<Snapshot>>,
}

impl BindingState {
    /// State for a binding that shows values unconverted.
    pub fn new(target: TargetKey) -> Self {
        Self::with_converters(target, ConverterList::new())
    }

    /// State for a binding whose values pass through `converters`.
    pub fn with_converters(target: TargetKey, converters: ConverterList) -> Self {
        Self {
            target,
            converters,
            dirty: AtomicBool::new(false),
            detached: AtomicBool::new(false),
            pending: Mutex::new(Pending::default()),
            rendered: Mutex::new(None),
        }
    }

    /// Where the value is drawn.
    pub fn target(&self) -> TargetKey {
        self.target
    }

    /// What this binding shows for a source value.
    pub fn present(&self, value: &BindingValue) -> BindingValue {
        self.converters.convert(value)
    }

    /// Store a new value and mark the binding dirty.
    ///
    /// Returns the new generation. Publishing an identical value is not
    /// suppressed here; the dispatcher only publishes on real changes.
    pub fn publish(&self, value: BindingValue) -> u64 {
        let generation = {
            let mut pending = self.pending.lock();
            pending.value = Some(value);
            pending.generation += 1;
            pending.generation
        };
        self.dirty.store(true, Ordering::Release);
        generation
    }

    /// The latest published value, if any.
    pub fn pending(&self) -> Option<Snapshot> {
        let pending = self.pending.lock();
        pending.value.clone().map(|value| Snapshot {
            value,
            generation: pending.generation,
        })
    }

    /// Whether anything has been published yet.
    pub fn has_value(&self) -> bool {
        self.pending.lock().value.is_some()
    }

    /// Whether a render is owed.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Clear the dirty flag, returning whether it was set.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    /// Set the dirty flag without publishing a value, e.g. to retry a
    /// failed render or redraw after a surface becomes visible.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Record a successful render.
    pub fn record_rendered(&self, snapshot: Snapshot) {
        *self.rendered.lock() = Some(snapshot);
    }

    /// Value shown by the last successful render.
    pub fn last_rendered(&self) -> Option<BindingValue> {
        self.rendered.lock().as_ref().map(|s| s.value.clone())
    }

    /// Generation shown by the last successful render.
    pub fn rendered_generation(&self) -> Option<u64> {
        self.rendered.lock().as_ref().map(|s| s.generation)
    }

    /// Stop accepting updates. Used when the owning surface is torn down.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::Release);
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }
}
