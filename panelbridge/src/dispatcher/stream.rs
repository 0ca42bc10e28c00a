//! Stream dispatcher implementation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::error::DispatchError;
use super::listener::DispatchListener;
use crate::binding::{Binding, BindingSource, BindingState, BindingValue};
use crate::control::{ControlRegistry, ValueKind};
use crate::formula::{truncate_result, Formula, FormulaState};
use crate::output::{Comparison, OutputValue};
use crate::protocol::StreamEvent;
use crate::telemetry::DispatchMetrics;

// =============================================================================
// Identifiers
// =============================================================================

/// Handle to an output subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(usize);

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output#{}", self.0)
    }
}

/// Handle to a formula subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormulaId(usize);

impl fmt::Display for FormulaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "formula#{}", self.0)
    }
}

/// Whether anything is watching an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressState {
    Idle,
    Active,
}

// =============================================================================
// Subscriber slots
// =============================================================================

struct OutputSlot {
    value: OutputValue,
    /// Feeds created for formula variables do not notify listeners.
    public: bool,
    formulas: Vec<FormulaId>,
    bindings: Vec<Arc<BindingState>>,
}

struct FormulaSlot {
    state: FormulaState,
    bindings: Vec<Arc<BindingState>>,
}

/// Publish `value` to every live binding. Returns whether any was dirtied.
fn publish(
    bindings: &[Arc<BindingState>],
    value: &BindingValue,
    skip_unchanged: bool,
    listeners: &[Arc<dyn DispatchListener>],
    metrics: &DispatchMetrics,
) -> bool {
    let mut dirtied = false;
    for state in bindings {
        if state.is_detached() {
            continue;
        }
        let shown = state.present(value);
        if skip_unchanged && state.pending().is_some_and(|s| s.value == shown) {
            continue;
        }
        state.publish(shown);
        metrics.binding_dirtied();
        for listener in listeners {
            listener.on_binding_dirty(state.target());
        }
        dirtied = true;
    }
    dirtied
}

/// Fan an accepted output change out to listeners, formulas and bindings.
fn propagate(
    slot: &OutputSlot,
    formulas: &mut [FormulaSlot],
    touched: &mut Vec<FormulaId>,
    listeners: &[Arc<dyn DispatchListener>],
    metrics: &DispatchMetrics,
) -> bool {
    metrics.value_changed();
    let Some(value) = slot.value.last_value() else {
        return false;
    };
    let control_id = slot.value.control_id();
    trace!(control = control_id, value = %value, "Value changed");

    if slot.public {
        for listener in listeners {
            listener.on_value_changed(control_id, value);
        }
    }

    if !slot.formulas.is_empty() {
        let numeric = value.as_f64().unwrap_or_else(|| {
            debug!(control = control_id, value = %value, "Non-numeric formula input, using 0");
            0.0
        });
        for &id in &slot.formulas {
            formulas[id.0].state.set_variable(control_id, numeric);
            if !touched.contains(&id) {
                touched.push(id);
            }
        }
    }

    publish(
        &slot.bindings,
        &BindingValue::from(value),
        false,
        listeners,
        metrics,
    )
}

// =============================================================================
// Stream Dispatcher
// =============================================================================

/// Routes stream events to subscribed outputs and formulas and marks
/// dependent bindings dirty.
///
/// Single writer: all state lives here and is mutated only by the task that
/// owns the dispatcher. Bindings are shared with the refresh scheduler
/// through [`BindingState`], and the scheduler is woken through the refresh
/// signal whenever a pass dirtied at least one binding.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use panelbridge::binding::{Binding, BindingValue};
/// use panelbridge::control::{ControlDescriptor, ControlRegistry};
/// use panelbridge::dispatcher::StreamDispatcher;
///
/// let registry = Arc::new(
///     ControlRegistry::from_descriptors(vec![
///         ControlDescriptor::integer("AAP_EGIPWR", 0x10EE, 0x0001, 0),
///     ])
///     .unwrap(),
/// );
/// let binding = Binding::import(
///     r"Binding{UpperCOM1}\o/{UpperActive}\o/Formula{(AAP_EGIPWR+1)/2}",
///     &registry,
/// )
/// .unwrap();
///
/// let mut dispatcher = StreamDispatcher::new(Arc::clone(&registry));
/// let state = dispatcher.attach_binding(&binding).unwrap();
///
/// dispatcher.on_stream_event(0x10EE, 1);
/// assert!(state.is_dirty());
/// assert_eq!(state.pending().unwrap().value, BindingValue::Integer(1));
/// ```
pub struct StreamDispatcher {
    registry: Arc<ControlRegistry>,
    addresses: HashMap<u32, Vec<OutputId>>,
    outputs: Vec<OutputSlot>,
    formulas: Vec<FormulaSlot>,
    feeds: HashMap<String, OutputId>,
    listeners: Vec<Arc<dyn DispatchListener>>,
    refresh: Arc<Notify>,
    metrics: Arc<DispatchMetrics>,
    touched: Vec<FormulaId>,
    /// String outputs holding words that wait for the end of the frame.
    staged: Vec<OutputId>,
}

impl StreamDispatcher {
    /// Create a dispatcher with no subscriptions.
    pub fn new(registry: Arc<ControlRegistry>) -> Self {
        Self {
            registry,
            addresses: HashMap::new(),
            outputs: Vec::new(),
            formulas: Vec::new(),
            feeds: HashMap::new(),
            listeners: Vec::new(),
            refresh: Arc::new(Notify::new()),
            metrics: Arc::new(DispatchMetrics::new()),
            touched: Vec::new(),
            staged: Vec::new(),
        }
    }

    /// Use a shared metrics instance.
    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Use a shared refresh signal.
    pub fn with_refresh_signal(mut self, refresh: Arc<Notify>) -> Self {
        self.refresh = refresh;
        self
    }

    /// Register a listener. Listeners are called in registration order.
    pub fn add_listener(&mut self, listener: Arc<dyn DispatchListener>) {
        self.listeners.push(listener);
    }

    /// Signal notified after any pass that dirtied a binding.
    pub fn refresh_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.refresh)
    }

    /// Shared dispatch counters.
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Control catalog used to resolve subscriptions.
    pub fn registry(&self) -> &Arc<ControlRegistry> {
        &self.registry
    }

    // -------------------------------------------------------------------------
    // Subscriptions
    // -------------------------------------------------------------------------

    /// Start watching `address`. Returns `false` if it was already watched.
    pub fn register_interest(&mut self, address: u32) -> bool {
        if self.addresses.contains_key(&address) {
            return false;
        }
        debug!(address = format_args!("0x{:04X}", address), "Watching address");
        self.addresses.insert(address, Vec::new());
        true
    }

    /// Whether `address` is watched.
    pub fn address_state(&self, address: u32) -> AddressState {
        if self.addresses.contains_key(&address) {
            AddressState::Active
        } else {
            AddressState::Idle
        }
    }

    /// Number of subscribers at `address`.
    pub fn subscriber_count(&self, address: u32) -> usize {
        self.addresses.get(&address).map_or(0, Vec::len)
    }

    /// Subscribe to a control. String controls are watched on every word
    /// address they span.
    pub fn subscribe_output(
        &mut self,
        control_id: &str,
        comparison: Comparison,
        treat_string_as_number: bool,
    ) -> Result<OutputId, DispatchError> {
        self.add_output(control_id, comparison, treat_string_as_number, true)
    }

    fn add_output(
        &mut self,
        control_id: &str,
        comparison: Comparison,
        treat_string_as_number: bool,
        public: bool,
    ) -> Result<OutputId, DispatchError> {
        let descriptor = self.registry.lookup(control_id)?;
        let addresses = descriptor.word_addresses();
        let value = OutputValue::new(descriptor, comparison, treat_string_as_number);

        let id = OutputId(self.outputs.len());
        for address in addresses {
            self.register_interest(address);
            self.addresses.entry(address).or_default().push(id);
        }
        self.outputs.push(OutputSlot {
            value,
            public,
            formulas: Vec::new(),
            bindings: Vec::new(),
        });

        debug!(output = %id, control = control_id, "Subscribed output");
        Ok(id)
    }

    /// Subscribe a formula. Each variable is fed by one internal
    /// subscription shared by every formula that references it.
    pub fn subscribe_formula(&mut self, formula: Formula) -> Result<FormulaId, DispatchError> {
        for variable in formula.variables() {
            self.registry.lookup(variable)?;
        }

        let id = FormulaId(self.formulas.len());
        let mut state = FormulaState::new(formula);
        let mut seeded = false;

        let variables = state.formula().variables().to_vec();
        for variable in variables {
            let feed = match self.feeds.get(&variable) {
                Some(&feed) => feed,
                None => {
                    let feed = self.add_output(&variable, Comparison::changed(), true, false)?;
                    self.feeds.insert(variable.clone(), feed);
                    feed
                }
            };
            let slot = &mut self.outputs[feed.0];
            slot.formulas.push(id);
            if let Some(value) = slot.value.last_value().and_then(|v| v.as_f64()) {
                state.set_variable(&variable, value);
                seeded = true;
            }
        }

        // A shared feed may already hold data that will not be resent.
        if seeded {
            if let Err(e) = state.evaluate() {
                debug!(
                    formula = %id,
                    expression = state.formula().expression(),
                    error = %e,
                    "Seed evaluation failed"
                );
            }
        }

        debug!(
            formula = %id,
            expression = state.formula().expression(),
            variables = ?state.formula().variables(),
            "Subscribed formula"
        );
        self.formulas.push(FormulaSlot {
            state,
            bindings: Vec::new(),
        });
        Ok(id)
    }

    /// Attach a binding and return its live state.
    pub fn attach_binding(&mut self, binding: &Binding) -> Result<Arc<BindingState>, DispatchError> {
        let target = binding.target_key().ok_or(DispatchError::Unplaced)?;
        let source = binding.source().ok_or(DispatchError::Unbound(target))?;
        let converters = binding.converters();
        let state = Arc::new(BindingState::with_converters(target, converters.clone()));

        match source {
            BindingSource::Output(spec) => {
                let id = self.subscribe_output(
                    &spec.control_id,
                    spec.comparison,
                    !converters.is_empty(),
                )?;
                self.outputs[id.0].bindings.push(Arc::clone(&state));
            }
            BindingSource::Formula(formula) => {
                let id = self.subscribe_formula(formula.clone())?;
                let slot = &mut self.formulas[id.0];
                if let Some(result) = slot.state.last_result() {
                    let seeded = BindingValue::Integer(truncate_result(result));
                    state.publish(state.present(&seeded));
                }
                slot.bindings.push(Arc::clone(&state));
            }
        }

        debug!(binding = %target, source = %source, "Attached binding");
        Ok(state)
    }

    /// Detach a binding so it no longer receives updates.
    pub fn detach_binding(&mut self, state: &Arc<BindingState>) {
        state.detach();
        for slot in &mut self.outputs {
            slot.bindings.retain(|b| !Arc::ptr_eq(b, state));
        }
        for slot in &mut self.formulas {
            slot.bindings.retain(|b| !Arc::ptr_eq(b, state));
        }
        debug!(binding = %state.target(), "Detached binding");
    }

    /// Decoded state of an output subscription.
    pub fn output(&self, id: OutputId) -> Option<&OutputValue> {
        self.outputs.get(id.0).map(|slot| &slot.value)
    }

    /// Live state of a formula subscription.
    pub fn formula(&self, id: FormulaId) -> Option<&FormulaState> {
        self.formulas.get(id.0).map(|slot| &slot.state)
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Apply a data word. Returns the number of subscribers whose value
    /// changed.
    ///
    /// Unwatched addresses are ignored. Subscribers are updated in
    /// subscription order; formulas touched by the pass are evaluated once
    /// each after it. String words are staged until the whole string has
    /// arrived or the frame ends.
    pub fn on_stream_event(&mut self, address: u32, data: u32) -> usize {
        self.metrics.event_received();

        let Self {
            addresses,
            outputs,
            formulas,
            listeners,
            metrics,
            touched,
            staged,
            ..
        } = self;

        let Some(ids) = addresses.get(&address) else {
            metrics.event_ignored();
            return 0;
        };

        let mut changed = 0;
        let mut dirtied = false;
        for &id in ids {
            let slot = &mut outputs[id.0];
            if !slot.value.apply_word(address, data) {
                if slot.value.has_staged() {
                    if !staged.contains(&id) {
                        staged.push(id);
                    }
                } else {
                    metrics.noop_update();
                }
                continue;
            }
            changed += 1;
            dirtied |= propagate(slot, formulas, touched, listeners, metrics);
        }

        self.finish_pass(dirtied);
        changed
    }

    /// Apply a complete string delivered for a string control's base
    /// address. Returns the number of subscribers whose value changed.
    pub fn on_string_event(&mut self, address: u32, text: &str) -> usize {
        self.metrics.event_received();

        let Self {
            addresses,
            outputs,
            formulas,
            listeners,
            metrics,
            touched,
            ..
        } = self;

        let Some(ids) = addresses.get(&address) else {
            metrics.event_ignored();
            return 0;
        };

        let mut changed = 0;
        let mut dirtied = false;
        for &id in ids {
            let slot = &mut outputs[id.0];
            if slot.value.kind() != ValueKind::String || slot.value.address() != address {
                continue;
            }
            if !slot.value.apply_string(text) {
                metrics.noop_update();
                continue;
            }
            changed += 1;
            dirtied |= propagate(slot, formulas, touched, listeners, metrics);
        }

        self.finish_pass(dirtied);
        changed
    }

    /// The host finished an update frame.
    ///
    /// String outputs that received only part of their words publish the
    /// assembled text now. Returns the number of outputs that changed.
    pub fn on_frame_end(&mut self) -> usize {
        self.metrics.frame_completed();

        let Self {
            outputs,
            formulas,
            listeners,
            metrics,
            touched,
            staged,
            ..
        } = self;

        let mut changed = 0;
        let mut dirtied = false;
        for id in staged.drain(..) {
            let slot = &mut outputs[id.0];
            if !slot.value.commit_staged() {
                continue;
            }
            changed += 1;
            dirtied |= propagate(slot, formulas, touched, listeners, metrics);
        }

        self.finish_pass(dirtied);
        trace!(changed, "Frame complete");
        changed
    }

    /// Route one parsed event.
    pub fn handle(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Word { address, data } => {
                self.on_stream_event(address, data);
            }
            StreamEvent::Text { address, text } => {
                self.on_string_event(address, &text);
            }
            StreamEvent::FrameEnd => {
                self.on_frame_end();
            }
        }
    }

    fn finish_pass(&mut self, mut dirtied: bool) {
        if !self.touched.is_empty() {
            let mut touched = std::mem::take(&mut self.touched);
            for &id in &touched {
                dirtied |= self.evaluate_formula(id);
            }
            touched.clear();
            self.touched = touched;
        }

        if dirtied {
            self.refresh.notify_one();
        }
    }

    fn evaluate_formula(&mut self, id: FormulaId) -> bool {
        let slot = &mut self.formulas[id.0];
        let result = slot.state.evaluate();
        self.metrics.formula_evaluated(result.is_ok());

        for listener in &self.listeners {
            listener.on_formula_evaluated(id, result.as_ref().copied());
        }

        let value = match &result {
            Ok(result) => BindingValue::Integer(truncate_result(*result)),
            Err(e) => {
                debug!(
                    formula = %id,
                    expression = slot.state.formula().expression(),
                    error = %e,
                    "Formula evaluation failed"
                );
                if slot.state.last_result().is_some() {
                    return false;
                }
                BindingValue::EvaluationFailed
            }
        };

        publish(&slot.bindings, &value, true, &self.listeners, &self.metrics)
    }

    // -------------------------------------------------------------------------
    // Event loop
    // -------------------------------------------------------------------------

    /// Consume events until the channel closes or shutdown is signalled.
    ///
    /// Returns the dispatcher so its final state can be inspected.
    pub async fn run(mut self, mut events: mpsc::Receiver<StreamEvent>, shutdown: CancellationToken) -> Self {
        info!(
            addresses = self.addresses.len(),
            outputs = self.outputs.len(),
            formulas = self.formulas.len(),
            "Dispatcher starting"
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Dispatcher shutting down");
                    break;
                }

                event = events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => {
                        info!("Event stream closed");
                        break;
                    }
                },
            }
        }

        info!("Dispatcher stopped");
        self
    }
}
