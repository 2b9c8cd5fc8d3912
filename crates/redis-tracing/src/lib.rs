//! Tracing hook for Redis clients.
//!
//! [`TracingHook`] wraps every command, and every pipeline, in a span. The
//! span is parented on whatever span the caller's [`Context`] carries, tagged
//! with the rendered statement, and finished exactly once when the command
//! returns. Errors become `error` / `db.error` tags; a missing key does not.
//!
//! # Example
//!
//! ```
//! use redis_tracing::{Cmd, Context, Hooks, Tracer, TracingHook};
//!
//! let (tracer, recorder) = Tracer::recording();
//!
//! let mut hooks = Hooks::new();
//! hooks.add_hook(TracingHook::new(tracer.clone()));
//!
//! // Spans created by the hook become children of the request span
//! let (request, ctx) = tracer.start_span_from_context(&Context::new(), "GET /users/42");
//!
//! let mut cmd = Cmd::new("get").arg("user:42");
//! hooks
//!     .process(&ctx, &mut cmd, |_ctx, _cmd| {
//!         // Send the command over the wire...
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! request.finish();
//!
//! let get = recorder.find("get").unwrap();
//! assert_eq!(get.parent_span_id, Some(request.context().span_id));
//! ```

mod command;
mod config;
mod context;
mod hook;
mod hooks;
mod recorder;
mod render;
mod sink;
mod span_builder;
mod tracer;

pub use command::{Arg, Cmd, CommandError};
pub use config::{HookConfig, ParsePipelineErrorsError, PipelineErrors};
pub use context::Context;
pub use hook::{tags, Hook, TracingHook};
pub use hooks::Hooks;
pub use recorder::SpanRecorder;
pub use redis_tracing_protocol::*;
pub use render::{cmd_string, cmds_string};
pub use sink::{ChannelSink, NoopSink, SpanSink};
pub use span_builder::{ActiveSpan, FinishGuard, SpanBuilder};
pub use tracer::Tracer;
