//! Best-effort enrichment of connection metadata.

pub mod geo;

pub use geo::{GeoLocator, Location, MaxMindLocator, NullLocator};
