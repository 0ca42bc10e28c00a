//! Callbacks for presentation collaborators.

use std::sync::Arc;

use parking_lot::Mutex;

use super::stream::FormulaId;
use crate::binding::TargetKey;
use crate::formula::FormulaError;
use crate::output::DecodedValue;

/// Observer of dispatch activity.
///
/// Callbacks run on the dispatcher task, inline with event processing, and
/// must not block. Every method defaults to a no-op.
pub trait DispatchListener: Send + Sync {
    /// A subscribed control accepted a new value.
    fn on_value_changed(&self, _control_id: &str, _value: &DecodedValue) {}

    /// A formula was evaluated.
    fn on_formula_evaluated(&self, _formula: FormulaId, _result: Result<f64, &FormulaError>) {}

    /// A binding was marked dirty.
    fn on_binding_dirty(&self, _target: TargetKey) {}
}

/// One recorded listener callback.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchNotice {
    ValueChanged {
        control_id: String,
        value: DecodedValue,
    },
    FormulaEvaluated {
        formula: FormulaId,
        result: Result<f64, FormulaError>,
    },
    BindingDirty(TargetKey),
}

/// Listener that records every callback, for diagnostics and tests.
#[derive(Debug, Default)]
pub struct RecordingListener {
    notices: Mutex<Vec<DispatchNotice>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<DispatchNotice> {
        std::mem::take(&mut *self.notices.lock())
    }

    pub fn len(&self) -> usize {
        self.notices.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.lock().is_empty()
    }
}

impl DispatchListener for RecordingListener {
    fn on_value_changed(&self, control_id: &str, value: &DecodedValue) {
        self.notices.lock().push(DispatchNotice::ValueChanged {
            control_id: control_id.to_string(),
            value: value.clone(),
        });
    }

    fn on_formula_evaluated(&self, formula: FormulaId, result: Result<f64, &FormulaError>) {
        self.notices.lock().push(DispatchNotice::FormulaEvaluated {
            formula,
            result: result.map_err(Clone::clone),
        });
    }

    fn on_binding_dirty(&self, target: TargetKey) {
        self.notices.lock().push(DispatchNotice::BindingDirty(target));
    }
}
