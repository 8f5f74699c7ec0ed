//! Mock sinks for asserting on emitted records.

use logify_core::LineSink;
use parking_lot::Mutex;
use serde_json::Value;

/// Local sink that captures emitted lines for inspection
#[derive(Default)]
pub struct CaptureSink {
    lines: Mutex<Vec<String>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw emitted lines, in order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Emitted lines parsed back from JSON.
    pub fn records(&self) -> Vec<Value> {
        self.lines
            .lock()
            .iter()
            .map(|line| serde_json::from_str(line).expect("emitted line must be valid JSON"))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl LineSink for CaptureSink {
    fn write_line(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}
