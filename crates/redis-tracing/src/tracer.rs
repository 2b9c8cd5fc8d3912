use redis_tracing_protocol::Span;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::context::Context;
use crate::recorder::SpanRecorder;
use crate::sink::{ChannelSink, NoopSink, SpanSink};
use crate::span_builder::{ActiveSpan, SpanBuilder};

const SERVICE_NAME_ENV: &str = "REDIS_TRACING_SERVICE_NAME";

/// Main entry point for creating spans
#[derive(Clone)]
pub struct Tracer {
    inner: Arc<TracerInner>,
}

struct TracerInner {
    service_name: String,
    sink: Arc<dyn SpanSink>,
}

impl Tracer {
    /// Create a tracer that hands finished spans to `sink`.
    ///
    /// The service name is read from `REDIS_TRACING_SERVICE_NAME`.
    pub fn new(sink: impl SpanSink + 'static) -> Self {
        let service_name =
            std::env::var(SERVICE_NAME_ENV).unwrap_or_else(|_| "unknown".to_string());
        Self::with_service_name(service_name, sink)
    }

    pub fn with_service_name(
        service_name: impl Into<String>,
        sink: impl SpanSink + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(TracerInner {
                service_name: service_name.into(),
                sink: Arc::new(sink),
            }),
        }
    }

    /// A tracer whose spans go nowhere
    pub fn noop() -> Self {
        Self::new(NoopSink)
    }

    /// A tracer that sends finished spans to the returned receiver
    ///
    /// # Example
    /// ```
    /// # use redis_tracing::Tracer;
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let (tracer, mut spans) = Tracer::channel();
    /// tracer.span("ping").start().finish();
    /// let span = spans.recv().await.unwrap();
    /// assert_eq!(span.operation_name, "ping");
    /// # }
    /// ```
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Span>) {
        let (span_tx, span_rx) = mpsc::unbounded_channel();
        (Self::new(ChannelSink::new(span_tx)), span_rx)
    }

    /// A tracer that keeps finished spans in memory
    pub fn recording() -> (Self, SpanRecorder) {
        let recorder = SpanRecorder::new();
        (Self::new(recorder.clone()), recorder)
    }

    pub fn service_name(&self) -> &str {
        &self.inner.service_name
    }

    /// Start building a new span
    pub fn span(&self, name: impl Into<String>) -> SpanBuilder {
        SpanBuilder::new(
            name.into(),
            self.inner.service_name.clone(),
            self.inner.sink.clone(),
        )
    }

    /// Start a span parented on whatever `ctx` carries.
    ///
    /// The active span wins over a remote parent; with neither, the span is
    /// the root of a new trace. Returns the span and a context holding it.
    pub fn start_span_from_context(
        &self,
        ctx: &Context,
        name: impl Into<String>,
    ) -> (ActiveSpan, Context) {
        let mut builder = self.span(name);
        if let Some(parent) = ctx.span() {
            builder = builder.child_of(parent.context());
        } else if let Some(remote) = ctx.remote_parent() {
            builder = builder.child_of(remote);
        }

        let span = builder.start();
        let ctx = ctx.with_span(span.clone());
        (span, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis_tracing_protocol::SpanContext;

    #[test]
    fn test_start_root_from_empty_context() {
        let tracer = Tracer::noop();
        let ctx = Context::new();
        let (span, next) = tracer.start_span_from_context(&ctx, "get");

        assert!(span.context().parent_span_id.is_none());
        assert_eq!(next.span().unwrap().context(), span.context());
        assert!(ctx.span().is_none());
    }

    #[test]
    fn test_start_from_remote_parent() {
        let tracer = Tracer::noop();
        let remote = SpanContext::new_root();
        let ctx = Context::new().with_remote_parent(remote.clone());
        let (span, _) = tracer.start_span_from_context(&ctx, "get");

        assert_eq!(span.context().trace_id, remote.trace_id);
        assert_eq!(span.context().parent_span_id, Some(remote.span_id));
    }

    #[test]
    fn test_active_span_beats_remote_parent() {
        let tracer = Tracer::noop();
        let local = tracer.span("request").start();
        let ctx = Context::new()
            .with_remote_parent(SpanContext::new_root())
            .with_span(local.clone());
        let (span, _) = tracer.start_span_from_context(&ctx, "get");

        assert_eq!(span.context().parent_span_id, Some(local.context().span_id));
    }

    #[test]
    fn test_service_name() {
        let tracer = Tracer::with_service_name("checkout", NoopSink);
        assert_eq!(tracer.service_name(), "checkout");
    }

    #[tokio::test]
    async fn test_channel_tracer() {
        let (span_tx, mut span_rx) = mpsc::unbounded_channel();
        let tracer = Tracer::with_service_name("cache", ChannelSink::new(span_tx));
        tracer.span("get").start().finish();
        tracer.span("set").start().finish();

        assert_eq!(span_rx.recv().await.unwrap().operation_name, "get");
        let set = span_rx.recv().await.unwrap();
        assert_eq!(set.operation_name, "set");
        assert_eq!(set.service_name, "cache");
    }
}
