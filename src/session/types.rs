use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::classification::types::CommandRecord;
use crate::session::SessionStatus;

/// One accepted SSH connection and its command exchange lifecycle.
///
/// Exclusively owned by its connection's task; destroyed once the final
/// summary has been logged.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub peer: SocketAddr,
    pub dst_ip: String,
    pub dst_port: u16,
    pub username: Option<String>,
    pub command_log: Vec<CommandRecord>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(peer: SocketAddr, dst_ip: &str, dst_port: u16) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer,
            dst_ip: dst_ip.to_string(),
            dst_port,
            username: None,
            command_log: Vec::new(),
            status: SessionStatus::Connecting,
            started_at: Utc::now(),
        }
    }

    /// Task identifier stamped on every record the session emits.
    pub fn task_name(&self) -> String {
        format!("session-{}", self.id)
    }
}

/// Why a session ended.
///
/// Both expected and abnormal endings are values, not exceptions; every
/// variant is routed through the same finalization path.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminationCause {
    /// End-of-stream or an explicit exit command.
    Graceful,
    /// Reset, broken pipe, or any transport-level failure mid-session.
    ConnectionLost,
    /// The configured idle bound expired with no input.
    IdleTimeout,
    /// An unclassified internal failure; the description is logged, never
    /// shown to the remote party.
    Fault(String),
}

impl TerminationCause {
    pub fn as_str(&self) -> &str {
        match self {
            TerminationCause::Graceful => "graceful end",
            TerminationCause::ConnectionLost => "connection lost",
            TerminationCause::IdleTimeout => "idle timeout",
            TerminationCause::Fault(_) => "internal fault",
        }
    }
}

impl std::fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_session_ids_are_unique() {
        let peer = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 45)), 40001);
        let a = Session::new(peer, "10.0.0.5", 8022);
        let b = Session::new(peer, "10.0.0.5", 8022);
        assert_ne!(a.id, b.id);
        assert_eq!(a.status, SessionStatus::Connecting);
    }

    #[test]
    fn test_task_name_carries_session_id() {
        let peer = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 45)), 40001);
        let session = Session::new(peer, "10.0.0.5", 8022);
        assert_eq!(session.task_name(), format!("session-{}", session.id));
    }
}
