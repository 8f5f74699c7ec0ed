//! Remote transport sinks.
//!
//! A transport is constructed once per logger tree and shared by every
//! child. Construction errors are surfaced synchronously and are a
//! different kind from push-time errors: a logger built with an unusable
//! transport configuration degrades to local logging, while push
//! failures are caught by the dispatch task and never reach the caller.

mod loki;

pub use loki::LokiTransport;

use thiserror::Error;

/// Transport construction failure (raised at logger-build time)
#[derive(Debug, Error)]
pub enum TransportBuildError {
    #[error("remote transport requires an endpoint url")]
    MissingUrl,

    #[error("invalid endpoint url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Push failure (caught by the dispatch task, reported, never thrown)
#[derive(Debug, Error)]
pub enum PushError {
    #[error("push rejected with status {0}")]
    Status(u16),

    #[error("push timed out")]
    Timeout,

    #[error("push connection failed: {0}")]
    Connection(reqwest::Error),
}
