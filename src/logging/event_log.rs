use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crate::error_handling::types::LoggingError;
use crate::logging::record::LogRecord;

/// Process-wide append-only sink for the structured record stream.
///
/// One instance is shared across all sessions behind an `Arc`; appends are
/// serialized through a mutex so concurrent sessions never interleave bytes
/// within a line. Records carry their own context fields, so the sink itself
/// is context-free.
pub struct EventLog {
    sensor_name: String,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl EventLog {
    /// Opens (creating if needed) the log file in append mode.
    pub fn open(path: &Path, sensor_name: &str) -> Result<Self, LoggingError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(LoggingError::OpenFailed)?;

        Ok(Self {
            sensor_name: sensor_name.to_string(),
            writer: Mutex::new(Box::new(file)),
        })
    }

    /// Sensor name stamped on every record emitted through this sink.
    pub fn sensor_name(&self) -> &str {
        &self.sensor_name
    }

    /// Appends one record as a single JSON line and flushes it, so consumers
    /// tailing the stream see events as they happen.
    pub fn append(&self, record: &LogRecord) -> Result<(), LoggingError> {
        let line = serde_json::to_string(record)
            .map_err(|e| LoggingError::EncodeFailed(e.to_string()))?;

        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(writer, "{}", line).map_err(LoggingError::WriteFailed)?;
        writer.flush().map_err(LoggingError::WriteFailed)
    }
}
