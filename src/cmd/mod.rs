//! Command objects: one invocable external process each.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

mod builder;

pub use builder::{CmdBuilder, FUNCTIONS_FILE_MARKER};

/// What actually gets handed to the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmdSource {
    /// Program followed by its arguments, no shell involved.
    Argv(Vec<String>),
    /// `shell shell_arg script`.
    Shell {
        shell: String,
        shell_arg: String,
        script: String,
    },
}

/// Built per invocation, run at most once, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdObj {
    source: CmdSource,
    display: String,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
    dont_log: bool,
}

impl CmdObj {
    pub(crate) fn new(source: CmdSource, display: String) -> Self {
        CmdObj { source, display, env: BTreeMap::new(), cwd: None, dont_log: false }
    }

    pub fn source(&self) -> &CmdSource {
        &self.source
    }

    /// The argument vector, when this command bypasses the shell.
    pub fn argv(&self) -> Option<&[String]> {
        match &self.source {
            CmdSource::Argv(args) => Some(args),
            CmdSource::Shell { .. } => None,
        }
    }

    /// The script handed to the shell, prelude included.
    pub fn raw_shell_string(&self) -> Option<&str> {
        match &self.source {
            CmdSource::Argv(_) => None,
            CmdSource::Shell { script, .. } => Some(script),
        }
    }

    /// Log rendering. For shell commands this is the script with any
    /// functions-file prelude replaced by [`FUNCTIONS_FILE_MARKER`].
    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn is_logged(&self) -> bool {
        !self.dont_log
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Keep this command out of the observer's command log.
    pub fn dont_log(mut self) -> Self {
        self.dont_log = true;
        self
    }

    /// A fresh `std::process::Command`; stdio is left for the caller to wire.
    pub(crate) fn to_command(&self) -> Command {
        let mut command = match &self.source {
            CmdSource::Argv(args) => {
                let (program, rest) = match args.split_first() {
                    Some((program, rest)) => (program.as_str(), rest),
                    None => ("", &[][..]),
                };
                let mut command = Command::new(program);
                command.args(rest);
                command
            }
            CmdSource::Shell { shell, shell_arg, script } => {
                let mut command = Command::new(shell);
                command.arg(shell_arg);
                push_script(&mut command, shell_arg, script);
                command
            }
        };
        command.envs(&self.env);
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }
        command
    }
}

impl fmt::Display for CmdObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

#[cfg(windows)]
fn push_script(command: &mut Command, shell_arg: &str, script: &str) {
    use std::os::windows::process::CommandExt;
    // cmd.exe parses its own command line; std's argument escaping would mangle it
    if shell_arg.eq_ignore_ascii_case("/c") {
        command.raw_arg(script);
    } else {
        command.arg(script);
    }
}

#[cfg(not(windows))]
fn push_script(command: &mut Command, _shell_arg: &str, script: &str) {
    command.arg(script);
}
