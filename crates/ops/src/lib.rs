use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

pub mod logging;
mod telemetry;

pub use telemetry::{init_tracer_layer, new_remote_log_handler, TracerGuard};

/// Telemetry configuration shared by the tracer and the structured logger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// OTLP gRPC endpoint of the trace collector.
    pub tracer_address: String,
    pub enable_tracer: bool,
    /// Minimum level rendered by the structured logger.
    pub logger_level: LogLevel,
    /// Endpoint of the remote log collector.
    pub logger_address: String,
    pub enable_remote_log: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tracer_address: "http://localhost:4317".to_string(),
            enable_tracer: false,
            logger_level: LogLevel::Info,
            logger_address: "http://localhost:3100".to_string(),
            enable_remote_log: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing_subscriber::filter::LevelFilter {
    fn from(level: LogLevel) -> Self {
        use tracing_subscriber::filter::LevelFilter;
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Log is the canonical JSON rendering of one event, together with the
/// still-open spans which enclose it.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Log {
    /// Timestamp at which the Log was created.
    #[serde(
        serialize_with = "time::serde::rfc3339::serialize",
        deserialize_with = "time::serde::rfc3339::deserialize"
    )]
    ts: time::OffsetDateTime,
    /// Level of the log.
    level: LogLevel,
    /// Message of the log.
    message: String,
    /// Supplemental fields of the log.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    fields: BTreeMap<String, serde_json::Value>,
    /// Spans enclosing the event, root first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    spans: Vec<Log>,
}

/// stderr_log_handler writes canonical JSON log serializations to stderr.
pub fn stderr_log_handler(log: Log) {
    let mut buf = serde_json::to_vec(&log).expect("Log always serializes");
    buf.push(b'\n');
    _ = std::io::stderr().write_all(&buf); // Best-effort.
}

/// new_encoded_json_write_handler returns a log handler that
/// writes canonical JSON log serializations to the given writer.
pub fn new_encoded_json_write_handler<W>(
    writer: std::sync::Arc<std::sync::Mutex<W>>,
) -> impl Fn(Log) + Send + Sync + 'static
where
    W: std::io::Write + Send + 'static,
{
    move |log: Log| {
        let mut buf = serde_json::to_vec(&log).expect("Log always serializes");
        buf.push(b'\n');
        _ = writer
            .lock()
            .expect("writer is never poisoned")
            .write_all(&buf); // Best-effort.
    }
}

#[cfg(test)]
mod test {
    use super::{new_encoded_json_write_handler, Log, LogLevel};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_encoded_json_write_handler() {
        let writer = Arc::new(Mutex::new(Vec::new()));
        let handler = new_encoded_json_write_handler(writer.clone());

        let mut log = Log {
            ts: time::OffsetDateTime::UNIX_EPOCH,
            level: LogLevel::Warn,
            message: "hello world".to_string(),
            fields: [("name".to_string(), serde_json::json!("value"))]
                .into_iter()
                .collect(),
            spans: Vec::new(),
        };

        handler(log.clone());
        log.message = "I'm different!".to_string();
        handler(log);

        std::mem::drop(handler);
        let writer = Arc::try_unwrap(writer).unwrap().into_inner().unwrap();

        insta::assert_snapshot!(String::from_utf8_lossy(&writer), @r###"
        {"ts":"1970-01-01T00:00:00Z","level":"warn","message":"hello world","fields":{"name":"value"}}
        {"ts":"1970-01-01T00:00:00Z","level":"warn","message":"I'm different!","fields":{"name":"value"}}
        "###);
    }
}
