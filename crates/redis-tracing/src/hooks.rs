use std::fmt;
use std::sync::Arc;

use crate::command::{Cmd, CommandError};
use crate::context::Context;
use crate::hook::Hook;

/// An ordered chain of hooks, run around command execution.
///
/// `before_*` callbacks run in insertion order and `after_*` callbacks in
/// reverse. Every hook whose `before_*` ran gets its `after_*` call, whatever
/// happened in between.
#[derive(Clone, Default)]
pub struct Hooks {
    hooks: Vec<Arc<dyn Hook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hook(&mut self, hook: impl Hook + 'static) {
        self.hooks.push(Arc::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run `f` for a single command, surrounded by the hooks.
    ///
    /// The outcome is stored on the command and returned. A failing
    /// `before_process` stops the chain and skips `f`.
    pub fn process<F>(&self, ctx: &Context, cmd: &mut Cmd, f: F) -> Result<(), CommandError>
    where
        F: FnOnce(&Context, &mut Cmd) -> Result<(), CommandError>,
    {
        let mut ctxs = Vec::with_capacity(self.hooks.len());
        let mut result = Ok(());

        for hook in &self.hooks {
            let incoming = ctxs.last().unwrap_or(ctx);
            match hook.before_process(incoming, cmd) {
                Ok(next) => ctxs.push(next),
                Err(err) => {
                    let incoming = incoming.clone();
                    ctxs.push(incoming);
                    cmd.set_err(Some(err.clone()));
                    result = Err(err);
                    break;
                }
            }
        }

        if result.is_ok() {
            result = f(ctxs.last().unwrap_or(ctx), cmd);
            cmd.set_err(result.as_ref().err().cloned());
        }

        // Each hook sees the context its own before_process returned
        for (hook, hook_ctx) in self.hooks.iter().zip(&ctxs).rev() {
            if let Err(err) = hook.after_process(hook_ctx, cmd) {
                cmd.set_err(Some(err.clone()));
                result = Err(err);
            }
        }

        result
    }

    /// Run `f` for a pipeline, surrounded by the hooks.
    ///
    /// `f` is expected to store each command's own outcome. Hook failures
    /// are stored on every command of the batch.
    pub fn process_pipeline<F>(
        &self,
        ctx: &Context,
        cmds: &mut [Cmd],
        f: F,
    ) -> Result<(), CommandError>
    where
        F: FnOnce(&Context, &mut [Cmd]) -> Result<(), CommandError>,
    {
        let mut ctxs = Vec::with_capacity(self.hooks.len());
        let mut result = Ok(());

        for hook in &self.hooks {
            let incoming = ctxs.last().unwrap_or(ctx);
            match hook.before_process_pipeline(incoming, cmds) {
                Ok(next) => ctxs.push(next),
                Err(err) => {
                    let incoming = incoming.clone();
                    ctxs.push(incoming);
                    set_cmds_err(cmds, &err);
                    result = Err(err);
                    break;
                }
            }
        }

        if result.is_ok() {
            result = f(ctxs.last().unwrap_or(ctx), cmds);
        }

        for (hook, hook_ctx) in self.hooks.iter().zip(&ctxs).rev() {
            if let Err(err) = hook.after_process_pipeline(hook_ctx, cmds) {
                set_cmds_err(cmds, &err);
                result = Err(err);
            }
        }

        result
    }
}

fn set_cmds_err(cmds: &mut [Cmd], err: &CommandError) {
    for cmd in cmds {
        cmd.set_err(Some(err.clone()));
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").field("len", &self.hooks.len()).finish()
    }
}
