//! Shared types and models for KitchenCommand
//!
//! This crate contains the pure domain layer: inventory models, metric
//! parsing and unit conversion, deduction strategy resolution, and field
//! validation. It performs no I/O and is shared between the backend and
//! any other component of the system.

pub mod models;
pub mod strategy;
pub mod types;
pub mod units;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
