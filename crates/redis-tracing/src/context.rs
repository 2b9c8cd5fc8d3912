//! Request-scoped context carrier.
//!
//! A [`Context`] is an immutable, append-only list of typed values. Extending
//! it returns a new carrier that shares the old entries, so a context handed
//! down the call chain can never be changed under the caller's feet.

use redis_tracing_protocol::{SpanContext, TraceContextError};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::span_builder::ActiveSpan;

#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Entry>>,
}

struct Entry {
    value: Box<dyn Any + Send + Sync>,
    next: Option<Arc<Entry>>,
}

struct CurrentSpan(ActiveSpan);

struct RemoteParent(SpanContext);

impl Context {
    /// An empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context whose remote parent comes from a W3C traceparent header
    pub fn from_traceparent(header: &str) -> Result<Self, TraceContextError> {
        let parent = SpanContext::from_traceparent(header)?;
        Ok(Self::new().with_remote_parent(parent))
    }

    /// Return a new context with `value` added on top
    pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Self {
        Self {
            head: Some(Arc::new(Entry {
                value: Box::new(value),
                next: self.head.clone(),
            })),
        }
    }

    /// Look up the most recently added value of type `T`
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        let mut entry = self.head.as_deref();
        while let Some(e) = entry {
            if let Some(value) = (*e.value).downcast_ref::<T>() {
                return Some(value);
            }
            entry = e.next.as_deref();
        }
        None
    }

    pub fn with_span(&self, span: ActiveSpan) -> Self {
        self.with_value(CurrentSpan(span))
    }

    /// The active span, if any
    pub fn span(&self) -> Option<&ActiveSpan> {
        self.get::<CurrentSpan>().map(|s| &s.0)
    }

    /// Attach a parent that lives in another process
    pub fn with_remote_parent(&self, parent: SpanContext) -> Self {
        self.with_value(RemoteParent(parent))
    }

    pub fn remote_parent(&self) -> Option<&SpanContext> {
        self.get::<RemoteParent>().map(|p| &p.0)
    }

    /// Number of values stacked in this context
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut entry = self.head.as_deref();
        while let Some(e) = entry {
            depth += 1;
            entry = e.next.as_deref();
        }
        depth
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("depth", &self.depth())
            .field("span", &self.span())
            .field("remote_parent", &self.remote_parent())
            .finish()
    }
}
