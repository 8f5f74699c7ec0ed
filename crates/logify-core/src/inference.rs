//! Call-site module inference.
//!
//! Derives a `"file.function"` origin tag from the live call stack when
//! auto-module is enabled and no explicit module was supplied. Inference
//! is best effort: missing symbols, stripped binaries, or unparseable
//! frames resolve to no tag, never to an error.
//!
//! Results are cached process-wide, keyed by a fingerprint of the first
//! few frame addresses. The fingerprint is cheap rather than perfectly
//! unique: two distinct call sites that share their leading frames can
//! alias to one entry. Known bounded-precision trade-off.

use backtrace::Backtrace;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fmt::Write as _;
use std::path::Path;

/// Soft bound on cached fingerprints.
pub const CACHE_CAPACITY: usize = 100;

/// How many leading frames feed the cache key.
const FINGERPRINT_FRAMES: usize = 8;

lazy_static! {
    static ref CACHE: Mutex<InferenceCache> = Mutex::new(InferenceCache::new(CACHE_CAPACITY));
}

/// Infer an origin tag for the current call site, consulting the cache.
pub fn infer_module() -> Option<String> {
    // Resolving symbols is the expensive part; fingerprint on raw
    // addresses first and only resolve on a cache miss.
    let mut trace = Backtrace::new_unresolved();
    let key = fingerprint(&trace)?;

    if let Some(cached) = CACHE.lock().get(&key) {
        return cached;
    }

    trace.resolve();
    let label = first_application_frame(&trace);
    CACHE.lock().insert(key, label.clone());
    label
}

fn fingerprint(trace: &Backtrace) -> Option<String> {
    let frames = trace.frames();
    if frames.is_empty() {
        return None;
    }
    let mut key = String::new();
    for frame in frames.iter().take(FINGERPRINT_FRAMES) {
        let _ = write!(key, "{:p};", frame.ip());
    }
    Some(key)
}

fn first_application_frame(trace: &Backtrace) -> Option<String> {
    for frame in trace.frames() {
        for symbol in frame.symbols() {
            let Some(name) = symbol.name() else { continue };
            let name = name.to_string();
            if is_internal_frame(&name) {
                continue;
            }
            return label_from_frame(&name, symbol.filename());
        }
    }
    None
}

/// Frames belonging to the logging core itself or to runtime plumbing
/// are skipped so the tag points at the caller.
fn is_internal_frame(symbol: &str) -> bool {
    const SKIP_CONTAINS: &[&str] = &["logify_core", "backtrace::"];
    const SKIP_PREFIXES: &[&str] = &["std::", "core::", "alloc::", "tokio::", "__rust", "rust_"];

    if SKIP_CONTAINS.iter().any(|p| symbol.contains(p)) {
        return true;
    }
    let unqualified = symbol.trim_start_matches('<');
    SKIP_PREFIXES.iter().any(|p| unqualified.starts_with(p))
}

/// Build `"file_stem.function"` from a symbol name and source path.
///
/// Mangled-hash suffixes and closure segments are dropped; when the
/// source path is unknown the enclosing module segment stands in for
/// the file stem.
fn label_from_frame(symbol: &str, filename: Option<&Path>) -> Option<String> {
    let mut segments: Vec<&str> = symbol.split("::").map(str::trim).collect();

    if segments.last().is_some_and(|s| is_symbol_hash(s)) {
        segments.pop();
    }
    while segments.last().is_some_and(|s| *s == "{{closure}}") {
        segments.pop();
    }

    let function = segments
        .last()?
        .trim_matches(|c| c == '<' || c == '>' || c == ' ');
    if function.is_empty() {
        return None;
    }

    let origin = filename
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .or_else(|| {
            (segments.len() >= 2).then(|| {
                segments[segments.len() - 2]
                    .trim_matches(|c| c == '<' || c == '>' || c == ' ')
                    .to_string()
            })
        })
        .filter(|o| !o.is_empty());

    match origin {
        Some(origin) => Some(format!("{origin}.{function}")),
        None => Some(function.to_string()),
    }
}

fn is_symbol_hash(segment: &str) -> bool {
    segment.len() == 17
        && segment.starts_with('h')
        && segment[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Bounded insertion-order cache. FIFO eviction on overflow (not LRU:
/// reads do not refresh an entry), no TTL, lives for the process.
struct InferenceCache {
    capacity: usize,
    entries: HashMap<String, Option<String>>,
    order: VecDeque<String>,
}

impl InferenceCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    fn get(&self, key: &str) -> Option<Option<String>> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: String, value: Option<String>) {
        // An existing key keeps its entry; a racing insert never clobbers.
        if self.entries.contains_key(&key) {
            return;
        }
        self.entries.insert(key.clone(), value);
        self.order.push_back(key);
        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
