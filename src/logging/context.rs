use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::logging::event_log::EventLog;
use crate::logging::record::{now_millis, LogLevel, LogRecord};

/// Per-session logging handle.
///
/// Created once when a connection arrives and threaded through every call in
/// that session's path, so call sites never pass endpoint fields explicitly
/// and records from concurrent sessions cannot pick up each other's context.
///
/// Records are mirrored as console one-liners through the `log` facade for
/// operators watching the terminal.
#[derive(Clone)]
pub struct SessionContext {
    log: Arc<EventLog>,
    task_name: String,
    src_ip: String,
    src_port: String,
    dst_ip: String,
    dst_port: String,
}

impl SessionContext {
    /// Context bound to one accepted connection.
    pub fn for_connection(
        log: Arc<EventLog>,
        task_name: String,
        peer: SocketAddr,
        dst_ip: &str,
        dst_port: u16,
    ) -> Self {
        Self {
            log,
            task_name,
            src_ip: peer.ip().to_string(),
            src_port: peer.port().to_string(),
            dst_ip: dst_ip.to_string(),
            dst_port: dst_port.to_string(),
        }
    }

    /// Context for events outside any connection (startup, admin monitor).
    pub fn for_process(log: Arc<EventLog>) -> Self {
        Self {
            log,
            task_name: String::from("main"),
            src_ip: String::from("-"),
            src_port: String::from("-"),
            dst_ip: String::from("-"),
            dst_port: String::from("-"),
        }
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn src_ip(&self) -> &str {
        &self.src_ip
    }

    pub fn info(&self, message: &str) {
        self.emit(LogLevel::Info, message, Map::new());
    }

    pub fn warning(&self, message: &str) {
        self.emit(LogLevel::Warning, message, Map::new());
    }

    pub fn error(&self, message: &str) {
        self.emit(LogLevel::Error, message, Map::new());
    }

    /// Emits a record with event-specific fields, e.g.
    /// `ctx.info_fields("Command Classified", json!({"command": cmd}))`.
    pub fn info_fields(&self, message: &str, fields: Value) {
        self.emit(LogLevel::Info, message, into_map(fields));
    }

    pub fn error_fields(&self, message: &str, fields: Value) {
        self.emit(LogLevel::Error, message, into_map(fields));
    }

    fn emit(&self, level: LogLevel, message: &str, extra: Map<String, Value>) {
        let record = LogRecord {
            timestamp: now_millis(),
            level,
            task_name: self.task_name.clone(),
            src_ip: self.src_ip.clone(),
            src_port: self.src_port.clone(),
            dst_ip: self.dst_ip.clone(),
            dst_port: self.dst_port.clone(),
            message: message.to_string(),
            sensor_name: self.log.sensor_name().to_string(),
            sensor_protocol: String::from("ssh"),
            extra,
        };

        log::log!(
            level.as_log_level(),
            "[{}] {} {}",
            self.task_name,
            self.src_ip,
            message
        );

        // A failed append must never take the session down with it.
        if let Err(e) = self.log.append(&record) {
            log::error!("failed to append log record: {}", e);
        }
    }
}

fn into_map(fields: Value) -> Map<String, Value> {
    match fields {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert(String::from("details"), other);
            map
        }
    }
}
