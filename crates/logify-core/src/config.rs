//! Validated logging configuration.
//!
//! Loading (file/env parsing) is the embedding application's job; this
//! module defines the value it must produce and the validation that runs
//! once at load time. Validation failures carry the offending field and
//! value and are never raised mid-logging.

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::record::Level;

/// Configuration error, raised synchronously at load time
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for '{field}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("missing value for '{field}'")]
    MissingValue { field: &'static str },
}

/// Which sink the logger writes to
///
/// `Console` and `Json` behave identically in this core (local stream
/// only); `Loki` activates the remote transport.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Console,
    Json,
    Loki,
}

/// Remote aggregation endpoint settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LokiConfig {
    /// Base endpoint URL, e.g. `http://loki:3100`
    pub url: String,

    /// Tenant scope, sent as `X-Scope-OrgID`
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Base64 basic-auth credential, used verbatim
    #[serde(default)]
    pub basic_auth: Option<String>,

    /// Service-level labels attached to every push
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// The validated configuration value consumed by the logging core
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// Minimum severity that is emitted
    #[serde(default)]
    pub log_level: Level,

    /// Inbound/outbound header carrying the per-request identifier
    #[serde(default = "default_request_id_header")]
    pub request_id_header: String,

    /// Inbound/outbound header carrying the correlation identifier
    #[serde(default = "default_ctid_header")]
    pub ctid_header: String,

    /// Active sink
    #[serde(default)]
    pub transport: TransportKind,

    /// Infer an origin tag from the call stack when none is supplied
    #[serde(default)]
    pub auto_module: bool,

    /// Remote transport settings, required when `transport` is `loki`
    #[serde(default)]
    pub loki: Option<LokiConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: Level::Info,
            request_id_header: default_request_id_header(),
            ctid_header: default_ctid_header(),
            transport: TransportKind::Console,
            auto_module: false,
            loki: None,
        }
    }
}

impl LogConfig {
    /// Validate the loaded value. Call once at configuration-load time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_id_header.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "requestIdHeader",
                value: self.request_id_header.clone(),
            });
        }
        if self.ctid_header.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ctidHeader",
                value: self.ctid_header.clone(),
            });
        }
        if self.transport == TransportKind::Loki {
            match &self.loki {
                None => return Err(ConfigError::MissingValue { field: "loki" }),
                Some(loki) if loki.url.trim().is_empty() => {
                    return Err(ConfigError::MissingValue { field: "loki.url" });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

fn default_request_id_header() -> String {
    "x-request-id".to_string()
}

fn default_ctid_header() -> String {
    "x-correlation-id".to_string()
}
