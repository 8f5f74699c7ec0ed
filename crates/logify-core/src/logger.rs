//! Logger core and child logger derivation.
//!
//! A `Logger` is an immutable configuration value: severity threshold,
//! inherited bindings, inherited module, local sink, optional remote
//! transport. Children copy bindings by value and share the transport
//! by reference, so a logger tree has no shared mutable state.
//!
//! Per call, exactly two side effects are possible: one synchronous
//! local-stream write, one fire-and-forget remote push. Remote failures
//! go to the diagnostic channel (`tracing`), never to the caller.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Write as _;
use std::sync::Arc;

use crate::config::{LogConfig, TransportKind};
use crate::context;
use crate::inference;
use crate::record::{now_iso_millis, ErrorDetails, Level, LogRecord};
use crate::transport::LokiTransport;

/// Local sink receiving one serialized JSON line per emitted record
pub trait LineSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Default local sink: newline-terminated lines on stdout
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn write_line(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{line}");
    }
}

/// Per-call options: explicit module, error value, extra key/values
#[derive(Debug, Default)]
pub struct CallOptions {
    module: Option<String>,
    error: Option<ErrorDetails>,
    fields: Map<String, Value>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit origin tag for this call only; wins over inference and
    /// the inherited module.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Attach an error value; its extracted fields land under
    /// `details.error`, overriding any bound `error` key.
    pub fn error<E: std::error::Error>(mut self, err: &E) -> Self {
        self.error = Some(ErrorDetails::from_error(err));
        self
    }

    /// Add one detail key/value.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add several detail key/values.
    pub fn fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.fields.extend(fields);
        self
    }
}

/// Structured logger
///
/// Cheap to clone; all shared parts are behind `Arc`.
#[derive(Clone)]
pub struct Logger {
    threshold: Level,
    auto_module: bool,
    base_bindings: Map<String, Value>,
    base_module: Option<String>,
    sink: Arc<dyn LineSink>,
    transport: Option<Arc<LokiTransport>>,
}

impl Logger {
    /// Build a logger from validated configuration.
    ///
    /// A misconfigured remote sink degrades to local-only logging with a
    /// diagnostic warning; it never prevents logger creation.
    pub fn from_config(config: &LogConfig) -> Self {
        let transport = match (config.transport, &config.loki) {
            (TransportKind::Loki, Some(loki_config)) => match LokiTransport::new(loki_config) {
                Ok(transport) => Some(Arc::new(transport)),
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        "loki transport unusable, falling back to local logging"
                    );
                    None
                }
            },
            (TransportKind::Loki, None) => {
                tracing::warn!("loki transport selected but not configured, falling back to local logging");
                None
            }
            _ => None,
        };

        Self {
            threshold: config.log_level,
            auto_module: config.auto_module,
            base_bindings: Map::new(),
            base_module: None,
            sink: Arc::new(StdoutSink),
            transport,
        }
    }

    /// Replace the local sink. The main seam for capturing output in
    /// tests and for embedding hosts that own their stdout.
    pub fn with_sink(mut self, sink: Arc<dyn LineSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Copy of this logger with an explicit base module.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.base_module = Some(module.into());
        self
    }

    /// Derive a child logger: bindings are the shallow union of the
    /// parent's and `bindings` (child wins on collision), the module and
    /// everything else is inherited, the transport is shared.
    pub fn child<I>(&self, bindings: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut merged = self.base_bindings.clone();
        merged.extend(bindings);

        Self {
            base_bindings: merged,
            ..self.clone()
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message.into(), CallOptions::new());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message.into(), CallOptions::new());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warn, message.into(), CallOptions::new());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message.into(), CallOptions::new());
    }

    pub fn debug_with(&self, message: impl Into<String>, options: CallOptions) {
        self.log(Level::Debug, message.into(), options);
    }

    pub fn info_with(&self, message: impl Into<String>, options: CallOptions) {
        self.log(Level::Info, message.into(), options);
    }

    pub fn warn_with(&self, message: impl Into<String>, options: CallOptions) {
        self.log(Level::Warn, message.into(), options);
    }

    pub fn error_with(&self, message: impl Into<String>, options: CallOptions) {
        self.log(Level::Error, message.into(), options);
    }

    fn log(&self, level: Level, message: String, options: CallOptions) {
        // The level filter runs before any other work.
        if level < self.threshold {
            return;
        }

        let ctx = context::current_context();
        let module = self.resolve_module(options.module);

        let mut details = self.base_bindings.clone();
        details.extend(options.fields);
        if let Some(error) = options.error {
            if let Ok(value) = serde_json::to_value(&error) {
                details.insert("error".to_string(), value);
            }
        }
        let details = if details.is_empty() { None } else { Some(details) };

        let record = LogRecord {
            timestamp: now_iso_millis(),
            level,
            message,
            request_id: ctx.request_id,
            ctid: ctx.ctid,
            module,
            details,
        };

        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize log record, dropping it");
                return;
            }
        };

        match &self.transport {
            None => self.sink.write_line(&line),
            Some(transport) => dispatch_remote(transport, line, level),
        }
    }

    /// Priority: explicit call-site module, then the inherited base
    /// module, then (when enabled) stack inference, then absent.
    fn resolve_module(&self, explicit: Option<String>) -> Option<String> {
        if explicit.is_some() {
            return explicit;
        }
        if self.base_module.is_some() {
            return self.base_module.clone();
        }
        if self.auto_module {
            return inference::infer_module();
        }
        None
    }
}

/// Fire-and-forget push. Requires a tokio runtime on the calling thread;
/// without one the remote line is dropped with a diagnostic warning
/// (local logging is unaffected either way).
fn dispatch_remote(transport: &Arc<LokiTransport>, line: String, level: Level) {
    let mut labels = BTreeMap::new();
    labels.insert("level".to_string(), level.as_str().to_string());

    let transport = Arc::clone(transport);
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(err) = transport.push(&line, &labels).await {
                    tracing::warn!(error = %err, "loki push failed");
                }
            });
        }
        Err(_) => {
            tracing::warn!("no tokio runtime for loki push, dropping line");
        }
    }
}
