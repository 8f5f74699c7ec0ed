//! Loki push transport.
//!
//! One POST per log line to `<endpoint>/loki/api/v1/push` — no batching
//! across calls, no retries, no connection state beyond the shared
//! `reqwest::Client`. Callers needing delivery guarantees must layer
//! them on top.

use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use super::{PushError, TransportBuildError};
use crate::config::LokiConfig;

/// Fixed sub-path of the push API.
const PUSH_PATH: &str = "loki/api/v1/push";

/// Tenant scope header understood by multi-tenant Loki.
const TENANT_HEADER: &str = "X-Scope-OrgID";

/// Per-push request timeout.
const PUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Label identifying this library on every stream.
const APP_LABEL: (&str, &str) = ("app", "logify");

/// Remote aggregation endpoint
///
/// Stateless across pushes; every call is an independent request.
pub struct LokiTransport {
    push_url: Url,
    client: reqwest::Client,
    tenant_id: Option<String>,
    basic_auth: Option<String>,
    base_labels: BTreeMap<String, String>,
}

impl LokiTransport {
    /// Build a transport from validated configuration.
    ///
    /// Fails fast on a missing or unparsable endpoint URL, before any
    /// logging occurs.
    pub fn new(config: &LokiConfig) -> Result<Self, TransportBuildError> {
        let raw = config.url.trim();
        if raw.is_empty() {
            return Err(TransportBuildError::MissingUrl);
        }

        // Parse the configured value as-is first so the error names the
        // offending input, then resolve the fixed push path against it.
        Url::parse(raw).map_err(|source| TransportBuildError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;
        let push_url = Url::parse(&format!("{}/{}", raw.trim_end_matches('/'), PUSH_PATH))
            .map_err(|source| TransportBuildError::InvalidUrl {
                url: raw.to_string(),
                source,
            })?;

        let client = reqwest::Client::builder().timeout(PUSH_TIMEOUT).build()?;

        let mut base_labels = BTreeMap::new();
        base_labels.insert(APP_LABEL.0.to_string(), APP_LABEL.1.to_string());
        base_labels.extend(config.labels.clone());

        Ok(Self {
            push_url,
            client,
            tenant_id: config.tenant_id.clone(),
            basic_auth: config.basic_auth.clone(),
            base_labels,
        })
    }

    /// Push one raw line as a single-value stream.
    ///
    /// `labels` are layered over the transport's base labels, call side
    /// winning on collision. Any 2xx status is success; everything else
    /// classifies as status failure, connection failure, or timeout.
    pub async fn push(
        &self,
        line: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<(), PushError> {
        let mut stream = self.base_labels.clone();
        stream.extend(labels.iter().map(|(k, v)| (k.clone(), v.clone())));

        let timestamp_ns = Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_string();
        let body = build_body(&stream, &timestamp_ns, line);

        let mut request = self.client.post(self.push_url.clone()).json(&body);
        if let Some(credential) = &self.basic_auth {
            request = request.header(AUTHORIZATION, format!("Basic {credential}"));
        }
        if let Some(tenant) = &self.tenant_id {
            request = request.header(TENANT_HEADER, tenant);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                PushError::Timeout
            } else {
                PushError::Connection(err)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Status(status.as_u16()));
        }
        Ok(())
    }

    /// Endpoint the transport resolved at construction time.
    pub fn push_url(&self) -> &Url {
        &self.push_url
    }
}

/// Wire body: exactly one stream carrying exactly one value pair.
fn build_body(
    labels: &BTreeMap<String, String>,
    timestamp_ns: &str,
    line: &str,
) -> serde_json::Value {
    json!({
        "streams": [{
            "stream": labels,
            "values": [[timestamp_ns, line]],
        }]
    })
}
