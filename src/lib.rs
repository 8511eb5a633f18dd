pub mod auth;
pub mod classification;
pub mod configuration;
pub mod controller;
pub mod enrichment;
pub mod error_handling;
pub mod generation;
pub mod logging;
pub mod network;
pub mod risk;
pub mod session;
