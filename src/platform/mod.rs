//! Static facts about the host: OS family, shell, and open-command templates.

use std::env;

use crate::render::{PosixRenderer, Renderer, WinRenderer};

static POSIX_RENDERER: PosixRenderer = PosixRenderer;
static WIN_RENDERER: WinRenderer = WinRenderer;

/// The two shell dialects a host can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Posix,
    Windows,
}

impl OsFamily {
    pub fn from_os_name(os: &str) -> Self {
        if os == "windows" { OsFamily::Windows } else { OsFamily::Posix }
    }

    pub fn renderer(self) -> &'static dyn Renderer {
        match self {
            OsFamily::Posix => &POSIX_RENDERER,
            OsFamily::Windows => &WIN_RENDERER,
        }
    }
}

/// Built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub family: OsFamily,
    pub os_name: String,
    pub shell: String,
    pub shell_arg: String,
    /// Emitted ahead of `. <file>` when a shell functions file is configured.
    pub functions_file_prefix: String,
    pub open_command: String,
    pub open_link_command: String,
}

impl Platform {
    /// Describe the running host, taking the user's shell from `$SHELL`.
    pub fn detect() -> Self {
        let os = env::consts::OS;
        match OsFamily::from_os_name(os) {
            OsFamily::Windows => Self::windows(),
            OsFamily::Posix => {
                let shell = env::var("SHELL")
                    .ok()
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "bash".to_string());
                let mut p = Self::posix(shell);
                p.os_name = os.to_string();
                if os == "macos" {
                    p.open_command = "open {{filename}}".into();
                    p.open_link_command = "open {{link}}".into();
                }
                p
            }
        }
    }

    /// A POSIX descriptor running commands through `shell -c`.
    pub fn posix(shell: impl Into<String>) -> Self {
        let shell = shell.into();
        let functions_file_prefix = if shell.ends_with("bash") {
            "shopt -s expand_aliases\n".to_string()
        } else {
            String::new()
        };
        Platform {
            family: OsFamily::Posix,
            os_name: "linux".into(),
            shell,
            shell_arg: "-c".into(),
            functions_file_prefix,
            open_command: "xdg-open {{filename}} >/dev/null".into(),
            open_link_command: "xdg-open {{link}} >/dev/null".into(),
        }
    }

    pub fn windows() -> Self {
        Platform {
            family: OsFamily::Windows,
            os_name: "windows".into(),
            shell: "cmd".into(),
            shell_arg: "/c".into(),
            functions_file_prefix: String::new(),
            open_command: "start \"\" {{filename}}".into(),
            open_link_command: "start \"\" {{link}}".into(),
        }
    }

    pub fn is_windows(&self) -> bool {
        self.family == OsFamily::Windows
    }

    pub fn renderer(&self) -> &'static dyn Renderer {
        self.family.renderer()
    }
}
