//! Runs a few commands against an in-memory fake store and prints the spans
//! the tracing hook produced.
//!
//! ```text
//! RUST_LOG=redis_tracing=debug cargo run --example simple_client
//! ```

use redis_tracing::{Arg, Cmd, CommandError, Context, HookConfig, Hooks, Tracer, TracingHook};
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

/// Stand-in for a connection: executes GET / SET / INCR against a map
#[derive(Default)]
struct FakeStore {
    data: HashMap<String, String>,
}

impl FakeStore {
    fn exec(&mut self, cmd: &Cmd) -> Result<(), CommandError> {
        let key = cmd
            .args()
            .get(1)
            .map(Arg::to_string)
            .ok_or_else(|| CommandError::Reply("ERR wrong number of arguments".into()))?;

        match cmd.name().as_str() {
            "get" => self.data.get(&key).map(|_| ()).ok_or(CommandError::Nil),
            "set" => {
                let value = cmd.args().get(2).map(Arg::to_string).unwrap_or_default();
                self.data.insert(key, value);
                Ok(())
            }
            "incr" => {
                let current = self.data.entry(key).or_insert_with(|| "0".to_string());
                let n: i64 = current.parse().map_err(|_| {
                    CommandError::Reply("ERR value is not an integer or out of range".into())
                })?;
                *current = (n + 1).to_string();
                Ok(())
            }
            other => Err(CommandError::Reply(format!("ERR unknown command '{other}'"))),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (tracer, recorder) = Tracer::recording();
    let mut hooks = Hooks::new();
    hooks.add_hook(TracingHook::with_config(tracer.clone(), HookConfig::from_env()));

    let mut store = FakeStore::default();
    let (request, ctx) = tracer.start_span_from_context(&Context::new(), "GET /profile");

    let mut set = Cmd::new("set").arg("user:1").arg("alice");
    hooks.process(&ctx, &mut set, |_, cmd| store.exec(cmd))?;

    // A miss is not an error for tracing purposes
    let mut get = Cmd::new("get").arg("user:2");
    let _ = hooks.process(&ctx, &mut get, |_, cmd| store.exec(cmd));

    let mut cmds = vec![
        Cmd::new("incr").arg("visits"),
        Cmd::new("incr").arg("user:1"),
        Cmd::new("get").arg("visits"),
    ];
    hooks.process_pipeline(&ctx, &mut cmds, |_, cmds| {
        for cmd in cmds.iter_mut() {
            let result = store.exec(cmd);
            cmd.set_err(result.err());
        }
        Ok(())
    })?;

    request.finish();

    let trace = recorder
        .trace(request.context().trace_id)
        .ok_or_else(|| anyhow::anyhow!("no spans recorded"))?;

    println!("trace {}", trace.trace_id);
    for span in &trace.spans {
        let indent = if span.span_id == trace.root_span_id { "" } else { "  " };
        println!(
            "{indent}{} ({} us)",
            span.operation_name,
            span.duration_nanos().unwrap_or_default() / 1_000
        );
        for (key, value) in &span.tags {
            println!("{indent}    {key} = {value:?}");
        }
    }

    Ok(())
}
