//! Human-readable rendering of commands for the `db.statement` tag.

use crate::command::{Arg, Cmd};

const NUM_ARG_LIMIT: usize = 32;
const ARG_LEN_LIMIT: usize = 64;
const NUM_CMD_LIMIT: usize = 100;
const NUM_NAME_LIMIT: usize = 10;

/// Render a single command, e.g. `set user:1 alice ex 60`
pub fn cmd_string(cmd: &Cmd) -> String {
    let mut out = String::with_capacity(32);
    append_cmd(&mut out, cmd);
    out
}

/// Render a batch, returning `(summary, statement)`.
///
/// The summary lists distinct command names in first-seen order; the
/// statement has one rendered command per line.
pub fn cmds_string(cmds: &[Cmd]) -> (String, String) {
    let mut names: Vec<String> = Vec::with_capacity(NUM_NAME_LIMIT);
    let mut out = String::with_capacity(32 * cmds.len());

    for (i, cmd) in cmds.iter().enumerate() {
        if i > NUM_CMD_LIMIT {
            break;
        }

        if i > 0 {
            out.push('\n');
        }
        append_cmd(&mut out, cmd);

        if names.len() >= NUM_NAME_LIMIT {
            continue;
        }

        let name = cmd.full_name();
        if !names.contains(&name) {
            names.push(name);
        }
    }

    (names.join(" "), out)
}

fn append_cmd(out: &mut String, cmd: &Cmd) {
    for (i, arg) in cmd.args().iter().enumerate() {
        if i > NUM_ARG_LIMIT {
            break;
        }
        if i > 0 {
            out.push(' ');
        }
        append_arg(out, arg);
    }

    if let Some(err) = cmd.err() {
        out.push_str(": ");
        out.push_str(&err.to_string());
    }
}

fn append_arg(out: &mut String, arg: &Arg) {
    match arg {
        Arg::Nil => out.push_str("<nil>"),
        Arg::Str(s) => append_bytes(out, s.as_bytes()),
        Arg::Bytes(b) => append_bytes(out, b),
        other => out.push_str(&other.to_string()),
    }
}

// Printable ASCII goes through as-is, anything else is hex-encoded.
fn append_bytes(out: &mut String, bytes: &[u8]) {
    let bytes = &bytes[..bytes.len().min(ARG_LEN_LIMIT)];
    if bytes.iter().all(|&c| (0x21..=0x7e).contains(&c)) {
        out.extend(bytes.iter().map(|&c| c as char));
    } else {
        out.push_str(&hex::encode(bytes));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandError;

    #[test]
    fn test_cmd_string() {
        let cmd = Cmd::new("set")
            .arg("user:1")
            .arg("alice")
            .arg("ex")
            .arg(60)
            .arg(1.5)
            .arg(true)
            .arg(None::<&str>);
        assert_eq!(cmd_string(&cmd), "set user:1 alice ex 60 1.5 true <nil>");
    }

    #[test]
    fn test_non_printable_args_are_hex_encoded() {
        let cmd = Cmd::new("set").arg("hello world").arg(vec![0u8, 1, 255]);
        assert_eq!(cmd_string(&cmd), "set 68656c6c6f20776f726c64 0001ff");
    }

    #[test]
    fn test_long_args_are_truncated() {
        let cmd = Cmd::new("set").arg("k").arg("x".repeat(100));
        assert_eq!(cmd_string(&cmd), format!("set k {}", "x".repeat(64)));
    }

    #[test]
    fn test_arg_count_limit() {
        let mut cmd = Cmd::new("mget");
        for i in 0..50 {
            cmd = cmd.arg(i);
        }
        let rendered = cmd_string(&cmd);
        assert_eq!(rendered.split(' ').count(), 33);
        assert!(rendered.ends_with(" 31"));
    }

    #[test]
    fn test_error_is_appended() {
        let mut cmd = Cmd::new("incr").arg("name");
        cmd.set_err(Some(CommandError::Reply(
            "ERR value is not an integer or out of range".into(),
        )));
        assert_eq!(
            cmd_string(&cmd),
            "incr name: ERR value is not an integer or out of range"
        );
    }

    #[test]
    fn test_cmds_string() {
        let cmds = vec![
            Cmd::new("set").arg("a").arg(1),
            Cmd::new("GET").arg("a"),
            Cmd::new("set").arg("b").arg(2),
            Cmd::new("cluster").arg("info"),
        ];
        let (summary, statement) = cmds_string(&cmds);
        assert_eq!(summary, "set get cluster info");
        assert_eq!(statement, "set a 1\nGET a\nset b 2\ncluster info");
    }

    #[test]
    fn test_cmds_string_name_limit() {
        let cmds: Vec<Cmd> = (0..15).map(|i| Cmd::new(format!("cmd{i}"))).collect();
        let (summary, statement) = cmds_string(&cmds);
        assert_eq!(summary.split(' ').count(), 10);
        assert!(summary.ends_with("cmd9"));
        assert_eq!(statement.lines().count(), 15);
    }

    #[test]
    fn test_cmds_string_batch_limit() {
        let cmds: Vec<Cmd> = (0..150).map(|i| Cmd::new("get").arg(i)).collect();
        let (summary, statement) = cmds_string(&cmds);
        assert_eq!(summary, "get");
        assert_eq!(statement.lines().count(), 101);
        assert_eq!(statement.lines().last(), Some("get 100"));
    }

    #[test]
    fn test_cmds_string_empty() {
        assert_eq!(cmds_string(&[]), (String::new(), String::new()));
    }
}
