//! `A | B | C` with every stage running concurrently.

use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Mutex, PoisonError};
use std::thread;

use log::error;

use super::Runner;
use crate::cmd::CmdObj;
use crate::error::{CmdError, Result};
use crate::render::render_pipe;

/// Failure text per stage, appended to from every stage's thread.
#[derive(Default)]
struct StageFailures(Mutex<Vec<(usize, String)>>);

impl StageFailures {
    fn record(&self, stage: usize, text: String) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push((stage, text));
    }

    fn into_ordered(self) -> Vec<String> {
        let mut failures = self.0.into_inner().unwrap_or_else(PoisonError::into_inner);
        failures.sort_by_key(|(stage, _)| *stage);
        failures.into_iter().map(|(_, text)| text).collect()
    }
}

impl Runner {
    /// Run a pipeline and return what its last stage wrote to stdout.
    pub fn pipe_with_output(&self, cmds: &[CmdObj]) -> Result<String> {
        Ok(self.run_pipeline(cmds, true)?.unwrap_or_default())
    }

    pub(super) fn run_pipeline(
        &self,
        cmds: &[CmdObj],
        capture_last: bool,
    ) -> Result<Option<String>> {
        if cmds.is_empty() {
            return Err(CmdError::EmptyPipeline);
        }

        let display = render_pipe(cmds);
        let mut commands: Vec<Command> = cmds.iter().map(CmdObj::to_command).collect();

        // Wire every stdout -> stdin pair before anything starts
        for i in 0..commands.len() - 1 {
            let (reader, writer) = io::pipe().map_err(|source| CmdError::Spawn {
                command: display.clone(),
                source,
            })?;
            commands[i].stdout(writer);
            commands[i + 1].stdin(reader);
        }
        if capture_last {
            if let Some(last) = commands.last_mut() {
                last.stdout(Stdio::piped());
            }
        }

        self.log(&display, true, cmds.iter().any(CmdObj::is_logged));

        let last_index = cmds.len() - 1;
        let failures = StageFailures::default();
        let outputs: Vec<Option<String>> = thread::scope(|s| {
            let handles: Vec<_> = commands
                .into_iter()
                .zip(cmds)
                .enumerate()
                .map(|(index, (command, cmd))| {
                    let failures = &failures;
                    s.spawn(move || run_stage(index, index == last_index, cmd, command, failures))
                })
                .collect();
            handles
                .into_iter()
                .enumerate()
                .map(|(index, h)| settle_stage(index, &cmds[index], h.join(), &failures))
                .collect()
        });

        let failures = failures.into_ordered();
        if !failures.is_empty() {
            return Err(CmdError::Pipeline { command: display, failures });
        }
        Ok(outputs.into_iter().last().flatten())
    }
}

/// Start one stage, drain its stderr to the end, then wait for it.
fn run_stage(
    index: usize,
    is_last: bool,
    cmd: &CmdObj,
    mut command: Command,
    failures: &StageFailures,
) -> Option<String> {
    command.stderr(Stdio::piped());
    let spawned = command.spawn();
    // Our copies of the pipe ends must close, or neighbours never see EOF
    drop(command);

    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            error!("failed to start pipeline stage `{}`: {}", cmd.display(), err);
            failures.record(index, format!("failed to start `{}`: {}", cmd.display(), err));
            return None;
        }
    };

    let stdout_reader = child.stdout.take().map(|mut out| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            out.read_to_end(&mut buf).map(|_| buf)
        })
    });

    let mut stderr = Vec::new();
    if let Some(mut pipe) = child.stderr.take() {
        if let Err(err) = pipe.read_to_end(&mut stderr) {
            error!("failed to read stderr of `{}`: {}", cmd.display(), err);
        }
    }
    let stderr = String::from_utf8_lossy(&stderr).into_owned();

    let status = child.wait();

    let stdout = match stdout_reader.map(|h| h.join()) {
        Some(Ok(Ok(buf))) => Some(String::from_utf8_lossy(&buf).into_owned()),
        Some(Ok(Err(err))) => {
            error!("failed to read stdout of `{}`: {}", cmd.display(), err);
            None
        }
        _ => None,
    };

    match status {
        Ok(_) if !stderr.is_empty() => failures.record(index, stderr),
        Ok(status) if !status.success() && !(!is_last && killed_by_sigpipe(&status)) => {
            error!("pipeline stage `{}` exited with {}", cmd.display(), status);
            failures.record(index, format!("`{}` exited with {}", cmd.display(), status));
        }
        Ok(_) => {}
        Err(err) => {
            error!("failed to wait for `{}`: {}", cmd.display(), err);
            let text = if stderr.is_empty() {
                format!("failed to wait for `{}`: {}", cmd.display(), err)
            } else {
                stderr
            };
            failures.record(index, text);
        }
    }
    stdout
}

/// A stage whose thread panicked still counts against the pipeline.
fn settle_stage(
    index: usize,
    cmd: &CmdObj,
    joined: thread::Result<Option<String>>,
    failures: &StageFailures,
) -> Option<String> {
    match joined {
        Ok(stdout) => stdout,
        Err(_) => {
            error!("pipeline stage `{}` panicked", cmd.display());
            failures.record(index, format!("`{}` panicked", cmd.display()));
            None
        }
    }
}

/// An upstream stage dies this way when a downstream one stops reading early.
#[cfg(unix)]
fn killed_by_sigpipe(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    const SIGPIPE: i32 = 13;
    status.signal() == Some(SIGPIPE)
}

#[cfg(not(unix))]
fn killed_by_sigpipe(_status: &ExitStatus) -> bool {
    false
}
