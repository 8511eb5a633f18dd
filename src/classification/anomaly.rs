use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::error_handling::types::LoggingError;
use crate::logging::record::now_millis;

/// Durable sink for commands the oracle could not score.
///
/// Append-only; deduplication is a consumer concern. Callers forward to the
/// sink without waiting on session-critical paths.
#[async_trait]
pub trait AnomalySink: Send + Sync {
    async fn record(&self, command: &str) -> Result<(), LoggingError>;
}

/// File-backed sink writing one JSON line per anomalous command.
pub struct FileAnomalySink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl FileAnomalySink {
    pub fn open(path: &Path) -> Result<Self, LoggingError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(LoggingError::OpenFailed)?;

        Ok(Self {
            writer: Mutex::new(Box::new(file)),
        })
    }
}

#[async_trait]
impl AnomalySink for FileAnomalySink {
    async fn record(&self, command: &str) -> Result<(), LoggingError> {
        let entry = json!({
            "timestamp": now_millis().to_rfc3339_opts(chrono::SecondsFormat::Millis, false),
            "command": command,
        });

        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(writer, "{}", entry).map_err(LoggingError::WriteFailed)?;
        writer.flush().map_err(LoggingError::WriteFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sink_appends_json_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anomalies.jsonl");
        let sink = FileAnomalySink::open(&path).unwrap();

        sink.record("xyzzy --frobnicate").await.unwrap();
        sink.record("plugh").await.unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["command"], "xyzzy --frobnicate");
        assert!(first["timestamp"].is_string());
    }
}
