//! PanelBridge - cockpit telemetry decoding for panel displays
//!
//! This library turns the flight simulator's export stream into named,
//! change-detected control values, combines them through user formulas and
//! refreshes the display bindings that depend on them.
//!
//! # Modules
//!
//! - [`protocol`] - export stream bytes to `(address, data)` events
//! - [`control`] - catalog of named controls
//! - [`output`] - per-control decoding and change detection
//! - [`formula`] - arithmetic over control values
//! - [`binding`] - display bindings, their text form and live state
//! - [`dispatcher`] - routes events to values, formulas and bindings
//! - [`refresh`] - redraws dirty bindings
//! - [`transport`] - UDP receiver
//! - [`app`] - wires a complete session

pub mod app;
pub mod binding;
pub mod config;
pub mod control;
pub mod dispatcher;
pub mod formula;
pub mod logging;
pub mod output;
pub mod protocol;
pub mod refresh;
pub mod telemetry;
pub mod transport;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
