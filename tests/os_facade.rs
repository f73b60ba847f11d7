//! End-to-end checks of the facade against the real OS.

#![cfg(unix)]

use std::fs;
use std::sync::{Arc, Mutex};

use oscmd::placeholders;
use oscmd::prelude::*;

fn facade() -> (OsCommand, Arc<Mutex<Vec<(String, bool)>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let logger = Arc::new(move |cmd: &str, compound: bool| {
        sink.lock().unwrap().push((cmd.to_string(), compound));
    });
    (OsCommand::new(Platform::posix("sh"), OsConfig::default(), logger), events)
}

#[test]
fn pipeline_through_the_facade_reports_stage_stderr() {
    let (os, events) = facade();
    let cmds = [
        os.cmd().new_shell("printf 'b\\na\\n'; echo 'upstream warning' >&2"),
        os.cmd().new_args(["sort"]),
        os.cmd().new_shell("cat >/dev/null"),
    ];
    let err = os.pipe_commands(&cmds).unwrap_err();
    assert!(matches!(err, CmdError::Pipeline { .. }));
    assert_eq!(err.to_string(), "upstream warning\n");

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0],
        ("printf 'b\\na\\n'; echo 'upstream warning' >&2 | sort | cat >/dev/null".to_string(), true)
    );
}

#[test]
fn pipeline_output_matches_sequential_transforms() {
    let (os, _) = facade();
    let b = os.cmd();
    let stages = [b.new_args(["printf", "3\\n1\\n2"]), b.new_args(["sort"]), b.new_args(["head", "-n", "2"])];
    let out = Runner::default().pipe_with_output(&stages).unwrap();
    assert_eq!(out.trim_end(), "1\n2");
}

#[test]
fn template_command_runs_with_quoted_value() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("my file.txt");
    let (os, events) = facade();

    let cmd = os
        .cmd()
        .new_shell_from_template("touch {{filename}}", &placeholders! { "filename" => os.quote(&target.to_string_lossy()) })
        .unwrap();
    os.executor().run(&cmd).unwrap();

    assert!(os.file_exists(&target).unwrap());
    assert!(!events.lock().unwrap().last().unwrap().1);
}

#[test]
fn file_helpers_compose() {
    let dir = tempfile::tempdir().unwrap();
    let ignore = dir.path().join("repo/.gitignore");
    let (os, _) = facade();

    os.create_file_with_content(&ignore, "target").unwrap();
    os.append_line_to_file(&ignore, "*.log").unwrap();
    assert_eq!(fs::read_to_string(&ignore).unwrap(), "target\n*.log\n");

    os.remove(dir.path().join("repo")).unwrap();
    assert!(!os.file_exists(&ignore).unwrap());
}
