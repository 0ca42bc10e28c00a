//! Binding definitions and their textual form.
//!
//! ```text
//! Binding{<DialPosition>}\o/{<SurfacePosition>}\o/Output{<control>|<comparison>|<operand>}
//! Binding{<DialPosition>}\o/{<SurfacePosition>}\o/Formula{<expression>}
//! ```
//!
//! Either form may end with `\o/Converters{...}`, see [`ConverterList`].

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::converter::{ConverterList, CONVERTERS_PREFIX};
use super::error::BindingError;
use super::position::{DialPosition, SurfacePosition, TargetKey};
use crate::control::ControlRegistry;
use crate::formula::{Formula, FORMULA_PREFIX};
use crate::output::{Comparison, ComparisonKind};

/// Separator between the segments of a binding definition.
pub const SEPARATOR: &str = "\\o/";

/// A single control shown on a display, with the comparison it was
/// configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub control_id: String,
    pub comparison: Comparison,
}

impl OutputSpec {
    /// Output of `control_id` with the given comparison.
    pub fn new(control_id: impl Into<String>, comparison: Comparison) -> Self {
        Self {
            control_id: control_id.into(),
            comparison,
        }
    }
}

impl fmt::Display for OutputSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Output{{{}|{}|{}}}",
            self.control_id, self.comparison.kind, self.comparison.operand
        )
    }
}

/// Where a binding takes its value from.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingSource {
    Output(OutputSpec),
    Formula(Formula),
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingSource::Output(spec) => spec.fmt(f),
            BindingSource::Formula(formula) => formula.fmt(f),
        }
    }
}

/// Association between a display position and a control or formula.
///
/// A binding has at most one source. Setting one kind of source replaces
/// the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    dial: Option<DialPosition>,
    position: Option<SurfacePosition>,
    source: Option<BindingSource>,
    converters: ConverterList,
}

fn binding_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Binding{dial}\o/{position}\o/source
        Regex::new(r"^Binding\{([^{}]*)\}\\o/\{([^{}]*)\}\\o/(.+)$").unwrap()
    })
}

fn output_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Output{control|comparison|operand}
        Regex::new(r"^Output\{([^{}|]*)\|([^{}|]*)\|([^{}|]*)\}$").unwrap()
    })
}

impl Binding {
    /// An unbound binding with no position.
    pub fn new() -> Self {
        Self::default()
    }

    /// An unbound binding at the given position.
    pub fn at(dial: DialPosition, position: SurfacePosition) -> Self {
        Self {
            dial: Some(dial),
            position: Some(position),
            source: None,
            converters: ConverterList::new(),
        }
    }

    /// Builder form of [`set_output`](Self::set_output).
    pub fn with_output(mut self, spec: OutputSpec) -> Self {
        self.set_output(spec);
        self
    }

    /// Builder form of [`set_formula`](Self::set_formula).
    pub fn with_formula(mut self, formula: Formula) -> Self {
        self.set_formula(formula);
        self
    }

    /// Builder form of [`set_converters`](Self::set_converters).
    pub fn with_converters(mut self, converters: ConverterList) -> Self {
        self.set_converters(converters);
        self
    }

    /// Radio dial position, if set.
    pub fn dial(&self) -> Option<DialPosition> {
        self.dial
    }

    /// Move the binding to another dial position.
    pub fn set_dial(&mut self, dial: DialPosition) {
        self.dial = Some(dial);
    }

    /// Display position on the surface, if set.
    pub fn position(&self) -> Option<SurfacePosition> {
        self.position
    }

    /// Move the binding to another display position.
    pub fn set_position(&mut self, position: SurfacePosition) {
        self.position = Some(position);
    }

    /// The control or formula this binding shows.
    pub fn source(&self) -> Option<&BindingSource> {
        self.source.as_ref()
    }

    /// Converters applied before display. Empty shows the raw value.
    pub fn converters(&self) -> &ConverterList {
        &self.converters
    }

    /// Mutable access for adding, replacing or removing converters.
    pub fn converters_mut(&mut self) -> &mut ConverterList {
        &mut self.converters
    }

    /// Replace all converters.
    pub fn set_converters(&mut self, converters: ConverterList) {
        self.converters = converters;
    }

    /// Bind to a single control, replacing any formula.
    pub fn set_output(&mut self, spec: OutputSpec) {
        self.source = Some(BindingSource::Output(spec));
    }

    /// Bind to a formula, replacing any single control.
    pub fn set_formula(&mut self, formula: Formula) {
        self.source = Some(BindingSource::Formula(formula));
    }

    /// Unbind. Positions and converters are kept.
    pub fn clear_source(&mut self) {
        self.source = None;
    }

    /// The single-control source, if that is what is bound.
    pub fn output(&self) -> Option<&OutputSpec> {
        match &self.source {
            Some(BindingSource::Output(spec)) => Some(spec),
            _ => None,
        }
    }

    /// The formula source, if that is what is bound.
    pub fn formula(&self) -> Option<&Formula> {
        match &self.source {
            Some(BindingSource::Formula(formula)) => Some(formula),
            _ => None,
        }
    }

    /// Whether a source is set.
    pub fn has_binding(&self) -> bool {
        self.source.is_some()
    }

    /// Whether the source is a formula.
    pub fn use_formula(&self) -> bool {
        matches!(self.source, Some(BindingSource::Formula(_)))
    }

    /// The render target, if both positions are set.
    pub fn target_key(&self) -> Option<TargetKey> {
        Some(TargetKey::new(self.dial?, self.position?))
    }

    /// Textual form of the binding.
    ///
    /// Returns `Ok(None)` for an unbound binding. A bound binding missing its
    /// dial or surface position cannot be exported.
    pub fn export(&self) -> Result<Option<String>, BindingError> {
        let Some(source) = &self.source else {
            return Ok(None);
        };
        let dial = self
            .dial
            .ok_or(BindingError::MissingDimension("dial position"))?;
        let position = self
            .position
            .ok_or(BindingError::MissingDimension("surface position"))?;

        let mut text = format!(
            "Binding{{{}}}{sep}{{{}}}{sep}{}",
            dial,
            position,
            source,
            sep = SEPARATOR
        );
        if !self.converters.is_empty() {
            text.push_str(SEPARATOR);
            text.push_str(&self.converters.to_string());
        }
        Ok(Some(text))
    }

    /// Whether the binding is complete enough to attach.
    ///
    /// Both positions and a source must be set, an output source must name
    /// a known control, and every converter must be reachable.
    pub fn check(&self, registry: &ControlRegistry) -> Result<(), BindingError> {
        if self.dial.is_none() {
            return Err(BindingError::MissingDimension("dial position"));
        }
        if self.position.is_none() {
            return Err(BindingError::MissingDimension("surface position"));
        }
        match &self.source {
            None => return Err(BindingError::NoSource),
            Some(BindingSource::Output(spec)) => {
                if !registry.contains(&spec.control_id) {
                    return Err(BindingError::UnknownControl(spec.control_id.clone()));
                }
            }
            Some(BindingSource::Formula(_)) => {}
        }
        self.converters.check()
    }

    /// Parse the textual form.
    ///
    /// Either a complete binding is returned or nothing is: any unknown token
    /// or control fails the whole import.
    pub fn import(text: &str, registry: &ControlRegistry) -> Result<Self, BindingError> {
        let captures = binding_pattern()
            .captures(text)
            .ok_or_else(|| BindingError::Malformed(text.to_string()))?;

        let dial: DialPosition = captures[1].trim().parse()?;
        let position: SurfacePosition = captures[2].trim().parse()?;

        let rest = &captures[3];
        let (source, converters) = match rest.split_once(SEPARATOR) {
            Some((source, converters)) if converters.starts_with(CONVERTERS_PREFIX) => {
                (source, ConverterList::import(converters)?)
            }
            Some(_) => return Err(BindingError::Malformed(text.to_string())),
            None => (rest, ConverterList::new()),
        };
        let source = parse_source(source, registry)?;

        let binding = Self {
            dial: Some(dial),
            position: Some(position),
            source: Some(source),
            converters,
        };
        binding.converters.check()?;
        Ok(binding)
    }
}

fn parse_source(text: &str, registry: &ControlRegistry) -> Result<BindingSource, BindingError> {
    if text.starts_with(FORMULA_PREFIX) {
        return Ok(BindingSource::Formula(Formula::import(text, registry)?));
    }

    let captures = output_pattern()
        .captures(text)
        .ok_or_else(|| BindingError::Malformed(text.to_string()))?;

    let control_id = &captures[1];
    registry
        .lookup(control_id)
        .map_err(|_| BindingError::UnknownControl(control_id.to_string()))?;

    let kind: ComparisonKind = captures[2]
        .parse()
        .map_err(|_| BindingError::UnknownComparison(captures[2].to_string()))?;

    let operand = captures[3]
        .parse::<u32>()
        .map_err(|_| BindingError::InvalidOperand(captures[3].to_string()))?;

    Ok(BindingSource::Output(OutputSpec::new(
        control_id,
        Comparison::new(kind, operand),
    )))
}
