//! Bindings between display positions and control values.
//!
//! A [`Binding`] is the static definition: which dial and display position it
//! targets and whether it shows a single control or a formula. Bindings are
//! persisted as one line each:
//!
//! ```text
//! Binding{UpperCOM1}\o/{UpperActive}\o/Output{ANT_EGIHQTOD|Equals|0}
//! Binding{UpperCOM1}\o/{UpperStandby}\o/Formula{(AAP_EGIPWR+1)/2}
//! Binding{LowerCOM1}\o/{LowerActive}\o/Output{AAP_EGIPWR|Changed|0}\o/Converters{Equals|0|OFF;Changed|0|ON}
//! ```
//!
//! The optional [`ConverterList`] segment replaces the raw value with a
//! label chosen by comparison.
//!
//! Once attached to the dispatcher a binding gets a [`BindingState`], the
//! dirty flag and value cache shared with the refresh scheduler.
//!
//! # Example
//!
//! ```
//! use panelbridge::binding::{Binding, DialPosition, SurfacePosition};
//! use panelbridge::control::{ControlDescriptor, ControlRegistry};
//!
//! let registry = ControlRegistry::from_descriptors(vec![
//!     ControlDescriptor::integer("ANT_EGIHQTOD", 0x10F0, 0x0002, 1),
//! ])
//! .unwrap();
//!
//! let line = r"Binding{UpperCOM1}\o/{UpperActive}\o/Output{ANT_EGIHQTOD|Equals|0}";
//! let binding = Binding::import(line, &registry).unwrap();
//! assert_eq!(binding.dial(), Some(DialPosition::UpperCOM1));
//! assert_eq!(binding.position(), Some(SurfacePosition::UpperActive));
//! assert_eq!(binding.export().unwrap().as_deref(), Some(line));
//! ```

mod converter;
mod definition;
mod error;
mod position;
mod set;
mod state;

pub use converter::{Converter, ConverterList, CONVERTERS_PREFIX};
pub use definition::{Binding, BindingSource, OutputSpec, SEPARATOR};
pub use error::BindingError;
pub use position::{DialPosition, SurfacePosition, TargetKey};
pub use set::{BindingSet, ImportReport};
pub use state::{BindingState, BindingValue, Snapshot};
