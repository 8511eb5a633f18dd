//! Session core module.
//!
//! One session covers one accepted SSH connection from admission to the
//! terminal summary. The engine here owns the per-session state machine;
//! transport plumbing stays in the network module.

use serde::{Deserialize, Serialize};

/// Submodule for the session state machine and command loop.
pub mod engine;
/// Submodule for session data structures.
pub mod types;

pub use engine::SessionEngine;
pub use types::{Session, TerminationCause};

/// Lifecycle state of a session.
///
/// Transitions run strictly forward:
/// `Connecting → Authenticating → Active → Closing → Closed`.
/// `Closed` is terminal; no reads or writes are permitted afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Connecting,
    Authenticating,
    Active,
    Closing,
    Closed,
}
