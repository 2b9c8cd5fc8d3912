use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::trace_context::{SpanId, TraceId};

/// Timestamp in nanoseconds since UNIX epoch
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        Self(nanos)
    }
}

/// A finished (or in-flight) operation in a trace
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Span {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub operation_name: String,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub tags: BTreeMap<String, TagValue>,
    pub service_name: String,
}

impl Span {
    /// Calculate span duration in nanoseconds
    pub fn duration_nanos(&self) -> Option<u64> {
        self.end_time
            .map(|end| end.0.saturating_sub(self.start_time.0))
    }

    pub fn tag(&self, key: &str) -> Option<&TagValue> {
        self.tags.get(key)
    }

    /// Whether the span carries the conventional `error = true` tag
    pub fn is_error(&self) -> bool {
        matches!(self.tags.get("error"), Some(TagValue::Bool(true)))
    }
}

/// Tag value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl TagValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for TagValue {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<usize> for TagValue {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Complete trace (collection of spans)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trace {
    pub trace_id: TraceId,
    pub spans: Vec<Span>,
    pub root_span_id: SpanId,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
}

impl Trace {
    /// Build a trace from a flat list of spans
    pub fn from_spans(mut spans: Vec<Span>) -> Option<Self> {
        if spans.is_empty() {
            return None;
        }

        spans.sort_by_key(|s| s.start_time);

        let trace_id = spans[0].trace_id;

        // Root is the span whose parent is not part of this trace
        let root_span = spans.iter().find(|s| match s.parent_span_id {
            None => true,
            Some(parent) => !spans.iter().any(|other| other.span_id == parent),
        })?;

        let root_span_id = root_span.span_id;
        let start_time = root_span.start_time;

        let end_time = spans.iter().filter_map(|s| s.end_time).max();

        Some(Self {
            trace_id,
            spans,
            root_span_id,
            start_time,
            end_time,
        })
    }

    pub fn root(&self) -> Option<&Span> {
        self.spans.iter().find(|s| s.span_id == self.root_span_id)
    }

    /// Get children of a given span
    pub fn children(&self, span_id: SpanId) -> Vec<&Span> {
        self.spans
            .iter()
            .filter(|s| s.parent_span_id == Some(span_id))
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.spans.iter().any(Span::is_error)
    }
}
