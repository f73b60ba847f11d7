//! OS facade: files, clipboard, environment and opening things, with every
//! external command routed through the builder and an [`Executor`].

use std::env;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;

use crate::cmd::{CmdBuilder, CmdObj};
use crate::config::OsConfig;
use crate::error::{CmdError, Result};
use crate::exec::{CommandLogger, Executor, Runner};
use crate::placeholders;
use crate::platform::Platform;
use crate::render::WinRenderer;

mod clipboard;

pub use clipboard::{Clipboard, NativeClipboard};

/// Longest clipboard text shown in the command log.
const CLIPBOARD_LOG_LIMIT: usize = 40;

type GetenvFn = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;
type CwdFn = Box<dyn Fn() -> io::Result<PathBuf> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Other,
}

/// What lives at `path`; anything that cannot be inspected is `Other`.
pub fn file_type(path: impl AsRef<Path>) -> FileType {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => FileType::Directory,
        Ok(_) => FileType::File,
        Err(_) => FileType::Other,
    }
}

/// The running binary's path, double-quoted and with forward slashes, for
/// handing to child processes that call back into it.
pub fn executable_path() -> String {
    let exe = env::current_exe()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| env::args().next().unwrap_or_default());
    let exe = if cfg!(windows) { exe.replace('\\', "/") } else { exe };
    format!("\"{}\"", exe)
}

pub struct OsCommand {
    platform: Arc<Platform>,
    config: OsConfig,
    cmd: CmdBuilder,
    executor: Arc<dyn Executor>,
    logger: Arc<dyn CommandLogger>,
    clipboard: Box<dyn Clipboard>,
    getenv_fn: GetenvFn,
    cwd_fn: CwdFn,
}

impl OsCommand {
    pub fn new(platform: Platform, config: OsConfig, logger: Arc<dyn CommandLogger>) -> Self {
        let platform = Arc::new(platform);
        let cmd = CmdBuilder::new(Arc::clone(&platform))
            .with_functions_file(&config.shell_functions_file);
        OsCommand {
            platform,
            config,
            cmd,
            executor: Arc::new(Runner::new(Arc::clone(&logger))),
            logger,
            clipboard: Box::new(NativeClipboard),
            getenv_fn: Box::new(|key: &str| env::var(key).ok()),
            cwd_fn: Box::new(env::current_dir),
        }
    }

    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_clipboard(mut self, clipboard: impl Clipboard + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    pub fn with_getenv(
        mut self,
        getenv: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.getenv_fn = Box::new(getenv);
        self
    }

    pub fn with_cwd_fn(
        mut self,
        cwd: impl Fn() -> io::Result<PathBuf> + Send + Sync + 'static,
    ) -> Self {
        self.cwd_fn = Box::new(cwd);
        self
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn config(&self) -> &OsConfig {
        &self.config
    }

    /// Builder for ad-hoc commands, sharing this facade's functions file.
    pub fn cmd(&self) -> &CmdBuilder {
        &self.cmd
    }

    pub fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }

    pub fn log_command(&self, cmd_str: &str, is_compound: bool) {
        info!("RunCommand: {}", cmd_str);
        self.logger.log_command(cmd_str, is_compound);
    }

    pub fn quote(&self, message: &str) -> String {
        self.cmd.quote(message)
    }

    pub fn open_file(&self, filename: &str) -> Result<()> {
        let template = non_empty_or(&self.config.open, &self.platform.open_command);
        let values = placeholders! { "filename" => self.quote(filename) };
        let cmd = self.cmd.new_shell_from_template(template, &values)?;
        self.executor.run(&cmd)
    }

    pub fn open_link(&self, link: &str) -> Result<()> {
        let template = non_empty_or(&self.config.open_link, &self.platform.open_link_command);
        let values = placeholders! { "link" => self.quote(link) };
        let cmd = self.cmd.new_shell_from_template(template, &values)?;
        self.executor.run(&cmd)
    }

    /// Append `line` plus a newline, first adding a newline if the file does
    /// not already end with one.
    pub fn append_line_to_file(&self, path: impl AsRef<Path>, line: &str) -> Result<()> {
        let path = path.as_ref();
        self.log_command(&format!("Appending '{}' to file '{}'", line, path.display()), false);

        let mut options = OpenOptions::new();
        options.read(true).append(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path).map_err(|e| CmdError::io(path, e))?;

        let len = file.metadata().map_err(|e| CmdError::io(path, e))?.len();
        let mut content = String::with_capacity(line.len() + 2);
        if len > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))
                .and_then(|_| file.read_exact(&mut last))
                .map_err(|e| CmdError::io(path, e))?;
            if last[0] != b'\n' {
                content.push('\n');
            }
        }
        content.push_str(line);
        content.push('\n');

        // One write, so a failure cannot leave just the separator behind
        file.write_all(content.as_bytes()).map_err(|e| CmdError::io(path, e))
    }

    /// Write `content` to `path`, creating parent directories and replacing
    /// any existing file.
    pub fn create_file_with_content(&self, path: impl AsRef<Path>, content: &str) -> Result<()> {
        let path = path.as_ref();
        self.log_command(&format!("Creating file '{}'", path.display()), false);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CmdError::io(parent, e))?;
        }
        fs::write(path, content).map_err(|e| CmdError::io(path, e))
    }

    /// Remove a file or a whole directory tree. A missing path is fine.
    pub fn remove(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.log_command(&format!("Removing '{}'", path.display()), false);

        let removed = match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
            Ok(_) => fs::remove_file(path),
            Err(e) => Err(e),
        };
        match removed {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(CmdError::io(path, e)),
            _ => Ok(()),
        }
    }

    /// Delete a single file; unlike [`OsCommand::remove`], a missing file is an error.
    pub fn remove_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.log_command(&format!("Deleting path '{}'", path.display()), false);
        fs::remove_file(path).map_err(|e| CmdError::io(path, e))
    }

    /// `Ok(false)` only when nothing is there; any other stat failure is an error.
    pub fn file_exists(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        match fs::metadata(path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CmdError::io(path, e)),
        }
    }

    /// Run `cmds` as one pipeline, `A | B | C`.
    pub fn pipe_commands(&self, cmds: &[CmdObj]) -> Result<()> {
        self.executor.pipe(cmds)
    }

    pub fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        let escaped = text.replace('\n', "\\n");
        let shown = truncate_with_ellipsis(&escaped, CLIPBOARD_LOG_LIMIT);
        self.log_command(&format!("Copying '{}' to clipboard", shown), false);

        if self.config.copy_to_clipboard_cmd.is_empty() {
            return self.clipboard.set_text(text);
        }
        let values = placeholders! { "text" => self.quote(text) };
        let cmd = self.cmd.new_shell_from_template(&self.config.copy_to_clipboard_cmd, &values)?;
        self.executor.run(&cmd).map_err(CmdError::clipboard)
    }

    /// Clipboard contents with CRLF line endings turned into LF.
    pub fn paste_from_clipboard(&self) -> Result<String> {
        let text = if self.config.read_from_clipboard_cmd.is_empty() {
            self.clipboard.get_text()?
        } else {
            let cmd = self.cmd.new_shell(&self.config.read_from_clipboard_cmd);
            self.executor.run_with_output(&cmd).map_err(CmdError::clipboard)?
        };
        Ok(text.replace("\r\n", "\n"))
    }

    pub fn getenv(&self, key: &str) -> Option<String> {
        (self.getenv_fn)(key)
    }

    pub fn temp_dir(&self) -> &Path {
        &self.config.temp_dir
    }

    /// Set the console title to the working directory's name. Only Windows
    /// consoles need this; elsewhere it does nothing.
    pub fn update_window_title(&self) -> Result<()> {
        if !self.platform.is_windows() {
            return Ok(());
        }
        let cwd = (self.cwd_fn)().map_err(|e| CmdError::io(".", e))?;
        let base = cwd
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| cwd.display().to_string());
        let title = if self.config.window_title_suffix.is_empty() {
            format!("title {}", WinRenderer::escape_caret(&base))
        } else {
            format!(
                "title {} - {}",
                WinRenderer::escape_caret(&base),
                WinRenderer::escape_caret(&self.config.window_title_suffix)
            )
        };
        self.executor.run(&self.cmd.new_shell(&title))
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

fn truncate_with_ellipsis(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        return s.to_string();
    }
    let keep = limit.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}
