//! Stream dispatch.
//!
//! The [`StreamDispatcher`] owns every live [`OutputValue`](crate::output::OutputValue)
//! and formula state. It consumes `(address, data)` events, applies change
//! detection per subscriber, re-evaluates dependent formulas and marks
//! dependent bindings dirty.
//!
//! # Architecture
//!
//! ```text
//! StreamEvent ──► address lookup ──► Idle ──► ignored
//!                      │
//!                      ▼ Active
//!               ┌──────────────┐
//!               │ OutputValue  │──► raw unchanged ──► no-op
//!               └──────┬───────┘
//!                      │ changed
//!          ┌───────────┼──────────────┐
//!          ▼           ▼              ▼
//!      listeners   bindings     formula queue
//!                  (dirty)            │ once per pass
//!                                     ▼
//!                               FormulaState ──► bindings (dirty)
//!                                                     │
//!                                        refresh signal (Notify)
//! ```

mod error;
mod listener;
mod stream;

pub use error::DispatchError;
pub use listener::{DispatchListener, DispatchNotice, RecordingListener};
pub use stream::{AddressState, FormulaId, OutputId, StreamDispatcher};
