//! CLI command implementations.

pub mod check;
pub mod config;
pub mod controls;
pub mod eval;
pub mod run;
