//! Control catalog.
//!
//! Every value the simulation host exports lives at a word address in a
//! shared memory map. A [`ControlDescriptor`] names one such value and says
//! how to decode it; the [`ControlRegistry`] holds all descriptors for the
//! loaded aircraft and is shared read-only for the life of the process.
//!
//! # Example
//!
//! ```
//! use panelbridge::control::{ControlDescriptor, ControlRegistry};
//!
//! let registry = ControlRegistry::from_descriptors(vec![
//!     ControlDescriptor::integer("AAP_EGIPWR", 0x10EE, 0x0001, 0),
//! ])
//! .unwrap();
//!
//! let egi = registry.lookup("AAP_EGIPWR").unwrap();
//! assert_eq!(egi.extract(0x0001), 1);
//! ```

mod descriptor;
pub mod loader;
mod registry;

pub use descriptor::{ControlDescriptor, ValueKind};
pub use registry::{ControlRegistry, RegistryError};
