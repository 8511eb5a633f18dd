use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity of a log record, wire-compatible with the uppercase level names
/// consumers of the record stream expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "ERROR")]
    Error,
}

impl LogLevel {
    /// Mapping onto the console logging facade.
    pub fn as_log_level(self) -> log::Level {
        match self {
            LogLevel::Info => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

/// One structured record, serialized as a single JSON object per line.
///
/// The fixed field set is always present; event-specific fields (`username`,
/// `command`, `classification`, `summary`, `details`, ...) ride along in
/// `extra` and are flattened into the same object on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub task_name: String,
    pub src_ip: String,
    pub src_port: String,
    pub dst_ip: String,
    pub dst_port: String,
    pub message: String,
    pub sensor_name: String,
    pub sensor_protocol: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Current UTC time truncated to millisecond precision, matching the wire
/// format so emitted and re-parsed records compare equal.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    let nanos = now.nanosecond() / 1_000_000 * 1_000_000;
    now.with_nanosecond(nanos).unwrap_or(now)
}

/// ISO-8601 UTC timestamps with millisecond precision and an explicit
/// offset, e.g. `2026-08-07T12:34:56.789+00:00`.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, false))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
