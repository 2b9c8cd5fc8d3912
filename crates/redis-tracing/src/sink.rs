use redis_tracing_protocol::Span;
use tokio::sync::mpsc;

/// Destination for finished spans
pub trait SpanSink: Send + Sync {
    fn record(&self, span: Span);
}

/// Discards every span
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl SpanSink for NoopSink {
    fn record(&self, _span: Span) {}
}

/// Forwards finished spans over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    span_tx: mpsc::UnboundedSender<Span>,
}

impl ChannelSink {
    pub fn new(span_tx: mpsc::UnboundedSender<Span>) -> Self {
        Self { span_tx }
    }
}

impl SpanSink for ChannelSink {
    fn record(&self, span: Span) {
        if let Err(e) = self.span_tx.send(span) {
            tracing::debug!(span_id = %e.0.span_id, "span receiver dropped, discarding span");
        }
    }
}
