//! End-to-end emission flows over the public API: record shape,
//! level filtering, binding inheritance, outbound header propagation.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use tests::{console_config, CaptureSink};

use logify_core::{
    current_context, merge_context, propagation_headers, run_with_context, CallOptions, Level,
    Logger, PropagationContext,
};

fn capture_logger(level: Level) -> (Logger, Arc<CaptureSink>) {
    let sink = Arc::new(CaptureSink::new());
    let logger = Logger::from_config(&console_config(level)).with_sink(sink.clone());
    (logger, sink)
}

#[tokio::test]
async fn end_to_end_console_scenario() {
    let (logger, sink) = capture_logger(Level::Debug);

    run_with_context(
        PropagationContext::new(Some("r1".to_string()), Some("c1".to_string())),
        async {
            logger.info_with("hello", CallOptions::new().field("foo", "bar"));
        },
    )
    .await;

    let records = sink.records();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record["level"], "info");
    assert_eq!(record["message"], "hello");
    assert_eq!(record["requestId"], "r1");
    assert_eq!(record["ctid"], "c1");
    assert_eq!(record["details"], json!({"foo": "bar"}));

    // Millisecond-precision UTC timestamp, e.g. 2026-08-24T12:34:56.789Z
    let ts = record["timestamp"].as_str().unwrap();
    assert_eq!(ts.len(), 24);
    assert!(ts.ends_with('Z'));
    assert_eq!(&ts[10..11], "T");
    assert_eq!(&ts[19..20], ".");
    assert!(ts[20..23].chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn level_threshold_filters_lower_severities() {
    let (logger, sink) = capture_logger(Level::Warn);

    logger.debug("dropped");
    logger.info("dropped");
    logger.warn("kept");
    logger.error("kept");

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["level"], "warn");
    assert_eq!(records[1]["level"], "error");
}

#[test]
fn record_without_bindings_has_no_details() {
    let (logger, sink) = capture_logger(Level::Info);
    logger.info("m");

    let record = &sink.records()[0];
    assert!(record.get("details").is_none());
    assert!(record.get("requestId").is_none());
    assert!(record.get("ctid").is_none());
}

#[test]
fn child_bindings_accumulate_with_rightmost_precedence() {
    let (logger, sink) = capture_logger(Level::Info);

    logger
        .child([("a".to_string(), json!(1))])
        .child([("a".to_string(), json!(2)), ("b".to_string(), json!(3))])
        .info_with("m", CallOptions::new().field("b", 4));

    assert_eq!(sink.records()[0]["details"], json!({"a": 2, "b": 4}));
}

#[tokio::test]
async fn merged_context_shows_up_on_subsequent_records() {
    let (logger, sink) = capture_logger(Level::Info);

    run_with_context(PropagationContext::for_request(None), async {
        logger.info("before");
        merge_context(PropagationContext::new(None, Some("joined-flow".to_string())));
        logger.info("after");
    })
    .await;

    let records = sink.records();
    assert_ne!(records[0]["ctid"], "joined-flow");
    assert_eq!(records[1]["ctid"], "joined-flow");
    // request id is untouched by the merge
    assert_eq!(records[0]["requestId"], records[1]["requestId"]);
}

#[tokio::test]
async fn outbound_headers_carry_active_identifiers() {
    let config = console_config(Level::Info);

    let headers = run_with_context(
        PropagationContext::new(Some("r9".to_string()), Some("c9".to_string())),
        async { propagation_headers(&config) },
    )
    .await;

    assert_eq!(headers.get("x-request-id").map(String::as_str), Some("r9"));
    assert_eq!(
        headers.get("x-correlation-id").map(String::as_str),
        Some("c9")
    );

    // Outside the scope nothing is propagated.
    assert!(propagation_headers(&config).is_empty());
    assert_eq!(current_context(), PropagationContext::default());
}

#[tokio::test]
async fn fresh_request_context_reuses_forwarded_ctid() {
    let (logger, sink) = capture_logger(Level::Info);

    run_with_context(
        PropagationContext::for_request(Some("upstream".to_string())),
        async {
            logger.info("m");
        },
    )
    .await;

    let record = &sink.records()[0];
    assert_eq!(record["ctid"], "upstream");
    assert!(record["requestId"].as_str().is_some());
}
