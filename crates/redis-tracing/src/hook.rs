//! The tracing hook.

use crate::command::{Cmd, CommandError};
use crate::config::{HookConfig, PipelineErrors};
use crate::context::Context;
use crate::render::{cmd_string, cmds_string};
use crate::span_builder::ActiveSpan;
use crate::tracer::Tracer;

/// Tag keys set by [`TracingHook`]
pub mod tags {
    pub const DB_STATEMENT: &str = "db.statement";
    pub const DB_ERROR: &str = "db.error";
    pub const DB_REDIS_NUM_CMD: &str = "db.redis.num_cmd";
    pub const ERROR: &str = "error";
}

/// Callbacks a client runs around every command and pipeline.
///
/// A client must pair every `before_*` call with the matching `after_*`
/// call, passing the context the `before_*` call returned.
pub trait Hook: Send + Sync {
    fn before_process(&self, ctx: &Context, cmd: &Cmd) -> Result<Context, CommandError>;

    fn after_process(&self, ctx: &Context, cmd: &Cmd) -> Result<(), CommandError>;

    fn before_process_pipeline(&self, ctx: &Context, cmds: &[Cmd])
        -> Result<Context, CommandError>;

    fn after_process_pipeline(&self, ctx: &Context, cmds: &[Cmd]) -> Result<(), CommandError>;
}

/// Wraps each command, and each pipeline, in a span.
///
/// # Example
///
/// ```
/// use redis_tracing::{Cmd, CommandError, Context, Hook, Tracer, TracingHook};
///
/// let (tracer, recorder) = Tracer::recording();
/// let hook = TracingHook::new(tracer);
///
/// let mut cmd = Cmd::new("get").arg("user:42");
/// let ctx = hook.before_process(&Context::new(), &cmd).unwrap();
/// cmd.set_err(Some(CommandError::Nil));
/// hook.after_process(&ctx, &cmd).unwrap();
///
/// let span = recorder.find("get").unwrap();
/// assert!(!span.is_error());
/// ```
#[derive(Clone)]
pub struct TracingHook {
    tracer: Tracer,
    config: HookConfig,
}

impl TracingHook {
    pub fn new(tracer: Tracer) -> Self {
        Self::with_config(tracer, HookConfig::default())
    }

    pub fn with_config(tracer: Tracer, config: HookConfig) -> Self {
        Self { tracer, config }
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    fn create_span(&self, ctx: &Context, operation_name: String) -> (ActiveSpan, Context) {
        let (span, ctx) = self.tracer.start_span_from_context(ctx, operation_name);
        span.set_tag(&self.config.db_system_key, self.config.db_system.as_str());
        (span, ctx)
    }

    fn current_span<'a>(&self, ctx: &'a Context, phase: &str) -> Option<&'a ActiveSpan> {
        let span = ctx.span();
        if span.is_none() {
            tracing::warn!("{phase} called with a context that carries no span");
        }
        span
    }
}

impl Hook for TracingHook {
    fn before_process(&self, ctx: &Context, cmd: &Cmd) -> Result<Context, CommandError> {
        let (span, ctx) = self.create_span(ctx, cmd.full_name());
        span.set_tag(tags::DB_STATEMENT, cmd_string(cmd));
        Ok(ctx)
    }

    fn after_process(&self, ctx: &Context, cmd: &Cmd) -> Result<(), CommandError> {
        let Some(span) = self.current_span(ctx, "after_process") else {
            return Ok(());
        };
        let _finish = span.finish_guard();

        if let Some(err) = cmd.err() {
            record_error(span, tags::DB_ERROR, err);
        }
        Ok(())
    }

    fn before_process_pipeline(
        &self,
        ctx: &Context,
        cmds: &[Cmd],
    ) -> Result<Context, CommandError> {
        let (summary, statement) = cmds_string(cmds);
        let (span, ctx) = self.create_span(ctx, format!("pipeline {summary}"));
        span.set_tag(tags::DB_REDIS_NUM_CMD, cmds.len());
        span.set_tag(tags::DB_STATEMENT, statement);
        Ok(ctx)
    }

    fn after_process_pipeline(&self, ctx: &Context, cmds: &[Cmd]) -> Result<(), CommandError> {
        let Some(span) = self.current_span(ctx, "after_process_pipeline") else {
            return Ok(());
        };
        let _finish = span.finish_guard();

        match self.config.pipeline_errors {
            PipelineErrors::FirstCommand => {
                if let Some(err) = cmds.first().and_then(Cmd::err) {
                    record_error(span, tags::DB_ERROR, err);
                }
            }
            PipelineErrors::EachCommand => {
                for (i, cmd) in cmds.iter().enumerate() {
                    if let Some(err) = cmd.err() {
                        record_error(span, &format!("{}{i}", tags::DB_ERROR), err);
                    }
                }
            }
        }
        Ok(())
    }
}

// A missing key is a normal outcome, not a failure.
fn record_error(span: &ActiveSpan, key: &str, err: &CommandError) {
    if err.is_nil() {
        return;
    }
    span.set_tag(tags::ERROR, true);
    span.set_tag(key, err.to_string());
}
