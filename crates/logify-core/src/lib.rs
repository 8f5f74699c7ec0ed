//! # Logify Core Library
//!
//! Cross-service structured logging: every line carries a per-request
//! identifier and a cross-service correlation identifier, inherited
//! key/value bindings, and an optional origin tag, and ships to a local
//! stream or a Loki push endpoint.
//!
//! ## Modules
//!
//! - `config` - Validated configuration value and load-time errors
//! - `context` - Task-scoped propagation context (request id / ctid)
//! - `record` - Severity levels, log records, extracted error details
//! - `logger` - Emission pipeline and child logger derivation
//! - `inference` - Call-site module inference with a bounded cache
//! - `transport` - Remote transport (Loki push) and its error kinds
//!
//! ## Usage
//!
//! ```no_run
//! use logify_core::{CallOptions, LogConfig, Logger, PropagationContext, run_with_context};
//!
//! # async fn handle_request(forwarded_ctid: Option<String>) {
//! let config = LogConfig::default();
//! config.validate().expect("invalid logging configuration");
//! let logger = Logger::from_config(&config);
//!
//! run_with_context(PropagationContext::for_request(forwarded_ctid), async {
//!     let logger = logger.child([("component".to_string(), "checkout".into())]);
//!     logger.info_with("payment accepted", CallOptions::new().field("amount", 1299));
//! })
//! .await;
//! # }
//! ```

pub mod config;
pub mod context;
pub mod inference;
pub mod logger;
pub mod record;
pub mod transport;

// Re-export the public surface
pub use config::{ConfigError, LogConfig, LokiConfig, TransportKind};
pub use context::{
    current_context, merge_context, propagation_headers, run_with_context, sync_scope,
    PropagationContext,
};
pub use inference::infer_module;
pub use logger::{CallOptions, LineSink, Logger, StdoutSink};
pub use record::{ErrorDetails, Level, LogRecord};
pub use transport::{LokiTransport, PushError, TransportBuildError};
