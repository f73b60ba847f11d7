//! Error taxonomy for command construction, execution and the OS facade.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CmdError {
    /// A template referenced `{{name}}` but no value was supplied for it.
    #[error("Placeholder missing: no value for '{{{{{name}}}}}'")]
    PlaceholderMissing { name: String },

    /// Strict resolution only: a value was supplied that the template never uses.
    #[error("Placeholder unused: '{name}' does not appear in the template")]
    PlaceholderUnused { name: String },

    #[error("Quote error: cannot quote {input:?}: {reason}")]
    Quote { input: String, reason: String },

    /// The OS refused to create the process.
    #[error("Spawn error: failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The process ran but did not exit successfully.
    #[error("Execution error: `{command}` exited with {}{}", status_text(.status), stderr_suffix(.stderr))]
    Execution {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    /// Aggregate of every failing stage of a pipeline, in stage order.
    #[error("{}", .failures.join("\n"))]
    Pipeline {
        command: String,
        failures: Vec<String>,
    },

    #[error("Pipeline error: no commands to run")]
    EmptyPipeline,

    #[error("IO error: {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Clipboard error: {message}")]
    Clipboard { message: String },
}

pub type Result<T> = std::result::Result<T, CmdError>;

impl CmdError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CmdError::Io { path: path.into(), source }
    }

    pub(crate) fn clipboard(message: impl ToString) -> Self {
        CmdError::Clipboard { message: message.to_string() }
    }
}

fn status_text(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim_end();
    if trimmed.is_empty() { String::new() } else { format!(": {}", trimmed) }
}
