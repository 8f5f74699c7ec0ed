//! Log record types: severity levels, the composed record, extracted error details.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Severity level
///
/// Derived `Ord` gives the filtering order: debug < info < warn < error.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// A single composed log line (emitted as JSON Lines)
///
/// Absent identifiers are omitted from the wire format entirely, never
/// serialized as null. `details` is omitted when there is nothing in it.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    /// ISO 8601 UTC timestamp, millisecond precision
    pub timestamp: String,

    /// Severity level
    pub level: Level,

    /// Message text
    pub message: String,

    /// Per-request identifier from the active propagation context
    #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Cross-service correlation identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctid: Option<String>,

    /// Origin tag ("file.function" shaped)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    /// Merged bindings and call-site key/values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Current time as ISO 8601 UTC with millisecond precision, e.g.
/// `2026-08-24T12:34:56.789Z`.
pub fn now_iso_millis() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Error fields extracted from a caller-supplied error value
///
/// Rust errors carry no JS-style stack string; the rendered `source()`
/// chain is the portable equivalent and always contains the message.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetails {
    pub name: String,
    pub message: String,
    pub stack: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ErrorDetails {
    /// Extract `{name, message, stack, cause?}` from any error value.
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        let name = short_type_name(std::any::type_name::<E>());
        let message = err.to_string();

        let mut stack = format!("{name}: {message}");
        let cause = err.source().map(|s| s.to_string());
        let mut source = err.source();
        while let Some(s) = source {
            stack.push_str("\n    caused by: ");
            stack.push_str(&s.to_string());
            source = s.source();
        }

        Self {
            name: name.to_string(),
            message,
            stack,
            cause,
        }
    }
}

/// Last path segment of a fully qualified type name, generics stripped.
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
