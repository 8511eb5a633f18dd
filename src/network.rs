//! Connection listener core module.
//!
//! Accepts SSH connections, extracts endpoint metadata, and hands each
//! connection to the session engine. The SSH transport itself (key
//! exchange, channels, version banner) is carried by `russh`; everything
//! observable about a connection flows through the engine.

pub mod listener;

pub use listener::{ClientHandler, SshListener};
