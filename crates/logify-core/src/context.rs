//! Task-scoped propagation context (the context store).
//!
//! Every inbound unit of work runs inside [`run_with_context`]; the
//! identifiers installed there are visible to every logging call made
//! during that scope, however deep the async call chain, without any
//! explicit parameter threading. Isolation is per logical task: two
//! interleaved requests never observe each other's identifiers.
//!
//! `tokio::spawn` starts a fresh task-local scope, so detached tasks do
//! not inherit automatically. Capture [`current_context`] before
//! spawning and re-enter [`run_with_context`] inside the task:
//!
//! ```ignore
//! let ctx = current_context();
//! tokio::spawn(run_with_context(ctx, async move { /* ... */ }));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use uuid::Uuid;

use crate::config::LogConfig;

tokio::task_local! {
    /// Active context for the current logical task. A `RefCell` rather
    /// than a plain value so `merge_context` can patch the active scope
    /// in place; only the owning task ever touches it, so no lock.
    static ACTIVE_CONTEXT: RefCell<PropagationContext>;
}

/// Identifiers propagated to every log record in a scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationContext {
    /// Identifier scoped to one inbound unit of work
    pub request_id: Option<String>,

    /// Correlation identifier persisting across a multi-service flow
    pub ctid: Option<String>,
}

impl PropagationContext {
    pub fn new(request_id: Option<String>, ctid: Option<String>) -> Self {
        Self { request_id, ctid }
    }

    /// Context for a fresh inbound request: a new request id, plus the
    /// forwarded correlation id when the upstream service sent one or a
    /// new one when it did not.
    pub fn for_request(forwarded_ctid: Option<String>) -> Self {
        Self {
            request_id: Some(Uuid::new_v4().to_string()),
            ctid: Some(forwarded_ctid.unwrap_or_else(|| Uuid::new_v4().to_string())),
        }
    }
}

/// Run `future` with `ctx` installed as the active context.
///
/// Nested calls layer: the inner value applies within the inner scope
/// and its descendants, and the outer value is restored for siblings.
pub async fn run_with_context<F>(ctx: PropagationContext, future: F) -> F::Output
where
    F: Future,
{
    ACTIVE_CONTEXT.scope(RefCell::new(ctx), future).await
}

/// Synchronous variant of [`run_with_context`] for non-async callers.
pub fn sync_scope<F, R>(ctx: PropagationContext, f: F) -> R
where
    F: FnOnce() -> R,
{
    ACTIVE_CONTEXT.sync_scope(RefCell::new(ctx), f)
}

/// Snapshot of the active context. Outside any scope this returns a
/// context with both fields unset; it never panics.
pub fn current_context() -> PropagationContext {
    ACTIVE_CONTEXT
        .try_with(|cell| cell.borrow().clone())
        .unwrap_or_default()
}

/// Merge `patch` into the currently active scope for its remaining
/// lifetime and all of its descendants. `None` fields are left as-is.
/// A no-op outside any scope. This is an escape hatch distinct from
/// nesting a new scope.
pub fn merge_context(patch: PropagationContext) {
    let _ = ACTIVE_CONTEXT.try_with(move |cell| {
        let mut active = cell.borrow_mut();
        if patch.request_id.is_some() {
            active.request_id = patch.request_id;
        }
        if patch.ctid.is_some() {
            active.ctid = patch.ctid;
        }
    });
}

/// Outbound headers for propagating the active identifiers to a
/// downstream service. Only identifiers that are present are included.
pub fn propagation_headers(config: &LogConfig) -> HashMap<String, String> {
    let ctx = current_context();
    let mut headers = HashMap::new();
    if let Some(request_id) = ctx.request_id {
        headers.insert(config.request_id_header.clone(), request_id);
    }
    if let Some(ctid) = ctx.ctid {
        headers.insert(config.ctid_header.clone(), ctid);
    }
    headers
}
