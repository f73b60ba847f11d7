//! Running command objects and reporting what ran.

use std::io;
use std::process::Stdio;
use std::sync::Arc;

use log::{debug, info};

use crate::cmd::CmdObj;
use crate::error::{CmdError, Result};

mod pipeline;

/// Receives one event per executed command, before the process starts.
/// `is_compound` is true for pipelines.
pub trait CommandLogger: Send + Sync {
    fn log_command(&self, cmd_str: &str, is_compound: bool);
}

impl<F> CommandLogger for F
where
    F: Fn(&str, bool) + Send + Sync,
{
    fn log_command(&self, cmd_str: &str, is_compound: bool) {
        self(cmd_str, is_compound)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl CommandLogger for NoopLogger {
    fn log_command(&self, _cmd_str: &str, _is_compound: bool) {}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub success: bool,
    pub status: Option<i32>,
    pub stdout: Option<String>,
    pub stderr_lines: Vec<String>,
}

impl ExecResult {
    pub fn stderr(&self) -> String {
        self.stderr_lines.join("\n")
    }
}

pub trait Executor: Send + Sync {
    /// Run to completion; a non-zero exit is an `Execution` error.
    fn run(&self, cmd: &CmdObj) -> Result<()>;

    /// Like [`Executor::run`], returning captured stdout.
    fn run_with_output(&self, cmd: &CmdObj) -> Result<String>;

    /// Run `cmds` as `A | B | C`, failing with the combined stderr of every stage.
    fn pipe(&self, cmds: &[CmdObj]) -> Result<()>;
}

/// Executes commands with the real OS.
#[derive(Clone)]
pub struct Runner {
    logger: Arc<dyn CommandLogger>,
}

impl Default for Runner {
    fn default() -> Self {
        Runner::new(Arc::new(NoopLogger))
    }
}

impl Runner {
    pub fn new(logger: Arc<dyn CommandLogger>) -> Self {
        Runner { logger }
    }

    pub(crate) fn log(&self, cmd_str: &str, is_compound: bool, to_observer: bool) {
        if to_observer {
            info!("RunCommand: {}", cmd_str);
            self.logger.log_command(cmd_str, is_compound);
        } else {
            debug!("RunCommand (unlogged): {}", cmd_str);
        }
    }

    /// Spawn `cmd`, wait for it, and collect what it wrote. Only a failure to
    /// start is an error here; the exit status is reported in the result.
    pub fn execute(&self, cmd: &CmdObj, capture_stdout: bool) -> Result<ExecResult> {
        self.log(cmd.display(), false, cmd.is_logged());

        if cmd.argv().is_some_and(|argv| argv.is_empty()) {
            return Err(CmdError::Spawn {
                command: cmd.display().to_string(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty argument vector"),
            });
        }

        let mut command = cmd.to_command();
        command
            .stdin(Stdio::null())
            .stdout(if capture_stdout { Stdio::piped() } else { Stdio::null() })
            .stderr(Stdio::piped());

        // `output` drains both pipes, waits, and closes every handle on return
        let output = command.output().map_err(|source| CmdError::Spawn {
            command: cmd.display().to_string(),
            source,
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(ExecResult {
            success: output.status.success(),
            status: output.status.code(),
            stdout: capture_stdout.then(|| String::from_utf8_lossy(&output.stdout).into_owned()),
            stderr_lines: stderr.lines().map(str::to_string).collect(),
        })
    }

    fn check(cmd: &CmdObj, result: ExecResult) -> Result<ExecResult> {
        if result.success {
            return Ok(result);
        }
        Err(CmdError::Execution {
            command: cmd.display().to_string(),
            status: result.status,
            stderr: result.stderr(),
        })
    }
}

impl Executor for Runner {
    fn run(&self, cmd: &CmdObj) -> Result<()> {
        let result = self.execute(cmd, false)?;
        Self::check(cmd, result).map(|_| ())
    }

    fn run_with_output(&self, cmd: &CmdObj) -> Result<String> {
        let result = self.execute(cmd, true)?;
        Ok(Self::check(cmd, result)?.stdout.unwrap_or_default())
    }

    fn pipe(&self, cmds: &[CmdObj]) -> Result<()> {
        self.run_pipeline(cmds, false).map(|_| ())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::cmd::CmdBuilder;
    use crate::platform::Platform;
    use std::sync::Mutex;

    fn builder() -> CmdBuilder {
        CmdBuilder::new(Arc::new(Platform::posix("sh")))
    }

    fn recording_runner() -> (Runner, Arc<Mutex<Vec<(String, bool)>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let runner = Runner::new(Arc::new(move |cmd: &str, compound: bool| {
            sink.lock().unwrap().push((cmd.to_string(), compound));
        }));
        (runner, events)
    }

    #[test]
    fn run_with_output_captures_stdout() {
        let out = Runner::default().run_with_output(&builder().new_args(["printf", "a b"])).unwrap();
        assert_eq!(out, "a b");
    }

    #[test]
    fn shell_command_sees_quoted_argument_once() {
        let b = builder();
        let cmd = b.new_shell(&format!("printf '%s|' {}", b.quote("my file.txt")));
        assert_eq!(Runner::default().run_with_output(&cmd).unwrap(), "my file.txt|");
    }

    #[test]
    fn non_zero_exit_is_an_execution_error_with_stderr() {
        let cmd = builder().new_shell("echo boom >&2; exit 3");
        let err = Runner::default().run(&cmd).unwrap_err();
        match err {
            CmdError::Execution { command, status, stderr } => {
                assert_eq!(command, "echo boom >&2; exit 3");
                assert_eq!(status, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = Runner::default().run(&builder().new_args(["definitely-not-a-real-program-xyz"])).unwrap_err();
        assert!(matches!(err, CmdError::Spawn { .. }));
    }

    #[test]
    fn empty_argv_is_a_spawn_error() {
        let err = Runner::default().run(&builder().new_args(Vec::<String>::new())).unwrap_err();
        assert!(matches!(err, CmdError::Spawn { .. }));
    }

    #[test]
    fn observer_sees_each_command_once_even_when_it_fails() {
        let (runner, events) = recording_runner();
        let _ = runner.run(&builder().new_shell("exit 1"));
        runner.run(&builder().new_args(["true"])).unwrap();
        let events = events.lock().unwrap();
        assert_eq!(*events, vec![("exit 1".to_string(), false), ("true".to_string(), false)]);
    }

    #[test]
    fn dont_log_skips_the_observer() {
        let (runner, events) = recording_runner();
        runner.run(&builder().new_args(["true"]).dont_log()).unwrap();
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn env_and_cwd_reach_the_process() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = builder()
            .new_shell("printf '%s' \"$OSCMD_TEST\"; pwd -P")
            .with_env("OSCMD_TEST", "set")
            .with_cwd(dir.path());
        let out = Runner::default().run_with_output(&cmd).unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        assert_eq!(out.trim_end(), format!("set{}", canonical.display()));
    }
}
