//! Session debug trace.

use serde::Serialize;
use serde_json::Value;

/// A labelled snapshot recorded in the trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugEntry {
    pub label: String,
    pub value: Value,
}

/// Ordered `(label, value)` log of what the session has seen.
///
/// Collection is unconditional; whether the trace is shown is up to the
/// presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DebugTrace {
    entries: Vec<DebugEntry>,
}

impl DebugTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a snapshot of `value` under `label`.
    ///
    /// Values that fail to serialize are recorded as their error string
    /// rather than dropped.
    pub fn push(&mut self, label: impl Into<String>, value: &impl Serialize) {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|err| Value::String(format!("<unserializable: {err}>")));
        self.entries.push(DebugEntry {
            label: label.into(),
            value,
        });
    }

    pub fn entries(&self) -> &[DebugEntry] {
        &self.entries
    }

    /// Entries recorded under `label`, in insertion order.
    pub fn with_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a DebugEntry> + 'a {
        self.entries.iter().filter(move |e| e.label == label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty JSON dump of the whole trace.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "[]".to_string())
    }
}
