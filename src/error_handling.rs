//! Error taxonomy for the sensor.
//!
//! Every subsystem exposes its own error enum; only configuration errors are
//! allowed to terminate the process. Everything else is recovered at the
//! boundary where it occurs.

pub mod types;

pub use types::*;
