use parking_lot::Mutex;
use redis_tracing_protocol::*;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::sink::SpanSink;

/// Builder for creating and starting spans
pub struct SpanBuilder {
    name: String,
    service_name: String,
    tags: BTreeMap<String, TagValue>,
    parent: Option<SpanContext>,
    sink: Arc<dyn SpanSink>,
}

impl SpanBuilder {
    pub(crate) fn new(name: String, service_name: String, sink: Arc<dyn SpanSink>) -> Self {
        Self {
            name,
            service_name,
            tags: BTreeMap::new(),
            parent: None,
            sink,
        }
    }

    /// Make the span a child of `parent`
    pub fn child_of(mut self, parent: &SpanContext) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Add a tag to the span
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Start the span
    pub fn start(self) -> ActiveSpan {
        let context = match &self.parent {
            Some(parent) => parent.child(),
            None => SpanContext::new_root(),
        };

        let span = Span {
            trace_id: context.trace_id,
            span_id: context.span_id,
            parent_span_id: context.parent_span_id,
            operation_name: self.name.clone(),
            start_time: Timestamp::now(),
            end_time: None,
            tags: self.tags,
            service_name: self.service_name,
        };

        tracing::debug!(
            span_id = %context.span_id,
            trace_id = %context.trace_id,
            parent = ?context.parent_span_id,
            "started span {}",
            self.name
        );

        ActiveSpan {
            inner: Arc::new(SpanInner {
                operation_name: self.name,
                context,
                span: Mutex::new(Some(span)),
                sink: self.sink,
            }),
        }
    }
}

/// Handle to a span that has been started.
///
/// Clones share the same span. The span is handed to the sink by the first
/// call to [`ActiveSpan::finish`]; later calls do nothing.
#[derive(Clone)]
pub struct ActiveSpan {
    inner: Arc<SpanInner>,
}

struct SpanInner {
    operation_name: String,
    context: SpanContext,
    // None once finished
    span: Mutex<Option<Span>>,
    sink: Arc<dyn SpanSink>,
}

impl ActiveSpan {
    /// Get the span context (for parenting and propagation)
    pub fn context(&self) -> &SpanContext {
        &self.inner.context
    }

    pub fn operation_name(&self) -> &str {
        &self.inner.operation_name
    }

    /// Set a tag, replacing any previous value under the same key
    pub fn set_tag(&self, key: impl Into<String>, value: impl Into<TagValue>) {
        let key = key.into();
        match self.inner.span.lock().as_mut() {
            Some(span) => {
                span.tags.insert(key, value.into());
            }
            None => {
                tracing::warn!(span_id = %self.inner.context.span_id, %key, "tag set on finished span");
            }
        }
    }

    /// Current value of a tag, while the span is still open
    pub fn tag(&self, key: &str) -> Option<TagValue> {
        self.inner
            .span
            .lock()
            .as_ref()
            .and_then(|span| span.tags.get(key).cloned())
    }

    pub fn is_finished(&self) -> bool {
        self.inner.span.lock().is_none()
    }

    /// End the span and hand it to the sink.
    ///
    /// Returns `true` for the call that actually finished the span.
    pub fn finish(&self) -> bool {
        let Some(mut span) = self.inner.span.lock().take() else {
            tracing::warn!(span_id = %self.inner.context.span_id, "span finished twice");
            return false;
        };

        span.end_time = Some(Timestamp::now());
        tracing::debug!(
            span_id = %span.span_id,
            duration_nanos = span.duration_nanos().unwrap_or_default(),
            "finished span {}",
            span.operation_name
        );
        self.inner.sink.record(span);
        true
    }

    /// Finish the span when the returned guard goes out of scope
    pub fn finish_guard(&self) -> FinishGuard<'_> {
        FinishGuard { span: self }
    }
}

impl fmt::Debug for ActiveSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSpan")
            .field("operation_name", &self.inner.operation_name)
            .field("context", &self.inner.context)
            .finish()
    }
}

impl Drop for SpanInner {
    fn drop(&mut self) {
        if self.span.get_mut().is_some() {
            tracing::debug!(
                span_id = %self.context.span_id,
                "span {} dropped without being finished",
                self.operation_name
            );
        }
    }
}

/// Finishes its span on drop, on every exit path
#[must_use = "the span is finished as soon as the guard is dropped"]
pub struct FinishGuard<'a> {
    span: &'a ActiveSpan,
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.span.finish();
    }
}
