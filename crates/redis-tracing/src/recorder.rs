use parking_lot::Mutex;
use redis_tracing_protocol::*;
use std::sync::Arc;

use crate::sink::SpanSink;

/// In-memory sink that keeps every finished span, in finish order.
///
/// Meant for tests and local debugging: it answers questions about names,
/// tags and parent/child relationships of the spans a hook produced.
#[derive(Clone, Default)]
pub struct SpanRecorder {
    spans: Arc<Mutex<Vec<Span>>>,
}

impl SpanRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all finished spans
    pub fn finished_spans(&self) -> Vec<Span> {
        self.spans.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.spans.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.lock().is_empty()
    }

    /// First finished span with the given operation name
    pub fn find(&self, operation_name: &str) -> Option<Span> {
        self.spans
            .lock()
            .iter()
            .find(|s| s.operation_name == operation_name)
            .cloned()
    }

    /// Finished spans whose parent is `span_id`
    pub fn children_of(&self, span_id: SpanId) -> Vec<Span> {
        self.spans
            .lock()
            .iter()
            .filter(|s| s.parent_span_id == Some(span_id))
            .cloned()
            .collect()
    }

    /// Assemble the finished spans of one trace
    pub fn trace(&self, trace_id: TraceId) -> Option<Trace> {
        let spans: Vec<Span> = self
            .spans
            .lock()
            .iter()
            .filter(|s| s.trace_id == trace_id)
            .cloned()
            .collect();
        Trace::from_spans(spans)
    }

    pub fn reset(&self) {
        self.spans.lock().clear();
    }
}

impl SpanSink for SpanRecorder {
    fn record(&self, span: Span) {
        self.spans.lock().push(span);
    }
}
