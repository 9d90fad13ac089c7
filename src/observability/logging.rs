//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber once at startup
//! - Render captured requests into log entries ([`RequestLogger`])
//!
//! # Design Decisions
//! - Each entry is a single `tracing` event, so the subscriber writes it in
//!   one call and concurrent requests never interleave partial entries
//! - Logging is best-effort: nothing here can fail a request

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::sync::Mutex;

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::{
    fmt::{self, time::ChronoLocal},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

use crate::config::ObservabilityConfig;
use crate::http::request::RequestSnapshot;

/// Timestamp format used by every log line.
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SEPARATOR_WIDTH: usize = 60;

/// Error raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to install subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. When a log file is
/// configured, output is appended to it without ANSI colours.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), LoggingError> {
    let level = config.log_level.to_ascii_lowercase();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("request_echo={level},tower_http={level}").into());
    let timer = ChronoLocal::new(LOG_TIME_FORMAT.to_string());
    let registry = tracing_subscriber::registry().with(filter);

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            registry
                .with(
                    fmt::layer()
                        .with_timer(timer)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()?;
        }
        None => {
            registry.with(fmt::layer().with_timer(timer)).try_init()?;
        }
    }

    Ok(())
}

/// Log sink for captured requests.
///
/// Constructed once by the process entry point and handed to handlers via
/// application state.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    enabled: bool,
}

impl RequestLogger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn from_config(config: &ObservabilityConfig) -> Self {
        Self::new(config.log_requests)
    }

    /// Emit one entry for `snapshot`. A status code marks the entry as a
    /// generated status response rather than an incoming request.
    pub fn log(&self, snapshot: &RequestSnapshot, status_code: Option<StatusCode>) {
        if !self.enabled {
            return;
        }

        let entry = format_entry(snapshot, status_code);
        match status_code {
            Some(status) => tracing::info!(
                method = %snapshot.method,
                path = %snapshot.path,
                status_code = status.as_u16(),
                "{entry}"
            ),
            None => tracing::info!(
                method = %snapshot.method,
                path = %snapshot.path,
                "{entry}"
            ),
        }
    }
}

/// Field order here is the order in the log line.
#[derive(Serialize)]
struct LogRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    client_ip: &'a str,
    http_version: &'a str,
    method: &'a str,
    path: &'a str,
    query_params: &'a str,
    headers: &'a BTreeMap<String, String>,
    body: Option<&'a str>,
}

/// Render the text of a log entry: heading, record, separator line.
pub fn format_entry(snapshot: &RequestSnapshot, status_code: Option<StatusCode>) -> String {
    let heading = match status_code {
        Some(_) => "Generated Error Code Response",
        None => "Incoming Request",
    };

    let record = LogRecord {
        status_code: status_code.map(|s| s.as_u16()),
        client_ip: &snapshot.client_address,
        http_version: &snapshot.http_version,
        method: &snapshot.method,
        path: &snapshot.path,
        query_params: &snapshot.query_raw,
        headers: &snapshot.headers,
        body: snapshot.body.as_deref(),
    };
    let record = serde_json::to_string(&record)
        .unwrap_or_else(|e| format!("<unserializable request record: {e}>"));

    format!("{heading}:\n{record}\n{}", "-".repeat(SEPARATOR_WIDTH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    fn snapshot() -> RequestSnapshot {
        RequestSnapshot {
            client_address: "127.0.0.1".into(),
            http_version: "1.1".into(),
            method: "POST".into(),
            path: "/foo/bar".into(),
            query_raw: "x=1&x=2".into(),
            query_params: BTreeMap::from([("x".into(), "2".into())]),
            headers: BTreeMap::from([("host".into(), "localhost".into())]),
            cookies: BTreeMap::new(),
            body: Some("hello".into()),
        }
    }

    #[test]
    fn incoming_entry_layout() {
        let entry = format_entry(&snapshot(), None);
        let expected = format!(
            "Incoming Request:\n\
             {{\"client_ip\":\"127.0.0.1\",\"http_version\":\"1.1\",\"method\":\"POST\",\
             \"path\":\"/foo/bar\",\"query_params\":\"x=1&x=2\",\
             \"headers\":{{\"host\":\"localhost\"}},\"body\":\"hello\"}}\n{}",
            "-".repeat(60)
        );
        assert_eq!(entry, expected);
    }

    #[test]
    fn status_entry_leads_with_code() {
        let entry = format_entry(&snapshot(), Some(StatusCode::IM_A_TEAPOT));
        let mut lines = entry.lines();
        assert_eq!(lines.next(), Some("Generated Error Code Response:"));
        assert!(lines
            .next()
            .is_some_and(|record| record.starts_with("{\"status_code\":418,\"client_ip\"")));
        assert_eq!(lines.next(), Some("-".repeat(60).as_str()));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_body_is_null() {
        let mut snapshot = snapshot();
        snapshot.body = None;
        assert!(format_entry(&snapshot, None).contains("\"body\":null"));
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn captured(logger: &RequestLogger, status_code: Option<StatusCode>) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || logger.log(&snapshot(), status_code));

        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn disabled_logger_is_silent() {
        assert_eq!(captured(&RequestLogger::new(false), None), "");
    }

    #[test]
    fn enabled_logger_emits_one_entry() {
        let output = captured(&RequestLogger::new(true), None);
        assert_eq!(output.matches("Incoming Request:").count(), 1);
        assert!(output.contains("\"path\":\"/foo/bar\""));

        let output = captured(&RequestLogger::new(true), Some(StatusCode::NOT_FOUND));
        assert_eq!(output.matches("Generated Error Code Response:").count(), 1);
        assert!(!output.contains("Incoming Request:"));
        assert!(output.contains("\"status_code\":404"));
    }
}
