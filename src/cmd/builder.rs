use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{CmdObj, CmdSource};
use crate::error::Result;
use crate::platform::Platform;
use crate::render::QuotePolicy;
use crate::tmpl::{resolve_placeholders, VariableResolver};

/// Stands in for the functions-file prelude in logged shell commands.
pub const FUNCTIONS_FILE_MARKER: &str = "[shell functions] ";

/// Turns argument lists, shell strings and templates into [`CmdObj`]s.
#[derive(Debug, Clone)]
pub struct CmdBuilder {
    platform: Arc<Platform>,
    functions_file: Option<PathBuf>,
}

impl CmdBuilder {
    pub fn new(platform: Arc<Platform>) -> Self {
        CmdBuilder { platform, functions_file: None }
    }

    /// Source `path` before every shell command. An empty path disables it.
    pub fn with_functions_file(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.functions_file = (!path.as_os_str().is_empty()).then(|| path.to_path_buf());
        self
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn functions_file(&self) -> Option<&Path> {
        self.functions_file.as_deref()
    }

    /// Wrap `s` in the platform's quotes so the shell reads it as one argument.
    pub fn quote(&self, s: &str) -> String {
        self.platform.renderer().quote(s)
    }

    pub fn quote_checked(&self, s: &str, policy: QuotePolicy) -> Result<String> {
        self.platform.renderer().quote_checked(s, policy)
    }

    /// A command run directly from its argument vector.
    pub fn new_args<I, S>(&self, args: I) -> CmdObj
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = args.into_iter().map(Into::into).collect();
        let display = self.platform.renderer().render_argv(&argv);
        CmdObj::new(CmdSource::Argv(argv), display)
    }

    /// A command run through the platform shell, with the functions file
    /// sourced first when one is configured.
    pub fn new_shell(&self, command: &str) -> CmdObj {
        let (script, display) = match self.functions_prelude() {
            Some(prelude) => (
                format!("{}{}", prelude, command),
                format!("{}{}", FUNCTIONS_FILE_MARKER, command),
            ),
            None => (command.to_string(), command.to_string()),
        };
        CmdObj::new(
            CmdSource::Shell {
                shell: self.platform.shell.clone(),
                shell_arg: self.platform.shell_arg.clone(),
                script,
            },
            display,
        )
    }

    /// Resolve `{{name}}` placeholders in `template`, then build a shell command.
    /// Values must already be quoted for the platform.
    pub fn new_shell_from_template<V>(&self, template: &str, values: &V) -> Result<CmdObj>
    where
        V: VariableResolver + ?Sized,
    {
        let command = resolve_placeholders(template, values)?;
        Ok(self.new_shell(&command))
    }

    /// The text executed ahead of a shell command, if a functions file is set.
    pub fn functions_prelude(&self) -> Option<String> {
        let path = self.functions_file.as_ref()?;
        let quoted = self.quote(&path.to_string_lossy());
        Some(if self.platform.is_windows() {
            format!("call {} && ", quoted)
        } else {
            format!("{}. {}\n", self.platform.functions_file_prefix, quoted)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholders;
    use proptest::prelude::*;

    fn posix() -> CmdBuilder {
        CmdBuilder::new(Arc::new(Platform::posix("sh")))
    }

    #[test]
    fn new_args_renders_display_with_quoting() {
        let cmd = posix().new_args(["git", "commit", "-m", "it's done"]);
        assert_eq!(cmd.argv().unwrap().len(), 4);
        assert_eq!(cmd.display(), "git commit -m 'it'\"'\"'s done'");
    }

    #[test]
    fn template_keeps_spaced_filename_as_one_argument() {
        let b = posix();
        let cmd = b
            .new_shell_from_template("open {{filename}}", &placeholders! { "filename" => b.quote("my file.txt") })
            .unwrap();
        assert_eq!(cmd.raw_shell_string(), Some("open 'my file.txt'"));
        assert_eq!(cmd.display(), "open 'my file.txt'");
    }

    #[test]
    fn missing_template_value_is_reported() {
        let err = posix().new_shell_from_template("open {{filename}}", &placeholders! {}).unwrap_err();
        assert!(err.to_string().contains("{{filename}}"));
    }

    #[test]
    fn functions_file_prelude_is_hidden_behind_marker() {
        let b = CmdBuilder::new(Arc::new(Platform::posix("/bin/bash"))).with_functions_file("/home/me/.funcs");
        let cmd = b.new_shell("my_func arg");
        assert_eq!(
            cmd.raw_shell_string(),
            Some("shopt -s expand_aliases\n. '/home/me/.funcs'\nmy_func arg")
        );
        assert_eq!(cmd.display(), "[shell functions] my_func arg");
    }

    #[test]
    fn empty_functions_file_means_no_prelude() {
        let b = posix().with_functions_file("");
        assert!(b.functions_prelude().is_none());
        assert_eq!(b.new_shell("ls").display(), "ls");
    }

    #[test]
    fn windows_prelude_calls_the_file() {
        let b = CmdBuilder::new(Arc::new(Platform::windows())).with_functions_file("C:\\my funcs.cmd");
        let cmd = b.new_shell("dir");
        assert_eq!(cmd.raw_shell_string(), Some("call \"C:\\my funcs.cmd\" && dir"));
        assert_eq!(b.quote("a b"), "\"a b\"");
    }

    #[cfg(unix)]
    #[test]
    fn functions_file_makes_functions_available() {
        let dir = tempfile::tempdir().unwrap();
        let funcs = dir.path().join("funcs.sh");
        std::fs::write(&funcs, "greet() { printf 'hello %s' \"$1\"; }\n").unwrap();
        let cmd = posix().with_functions_file(&funcs).new_shell("greet world");
        let out = cmd.to_command().output().unwrap();
        assert_eq!(String::from_utf8_lossy(&out.stdout), "hello world");
    }

    proptest! {
        /// Property: the logged text is the executed script, modulo the prelude
        #[test]
        fn display_matches_executed_script(command in "[ -~]{0,40}", with_funcs in any::<bool>()) {
            let mut b = posix();
            if with_funcs {
                b = b.with_functions_file("/etc/funcs.sh");
            }
            let cmd = b.new_shell(&command);
            let script = cmd.raw_shell_string().unwrap().to_string();
            match b.functions_prelude() {
                Some(prelude) => {
                    let shown = cmd.display().strip_prefix(FUNCTIONS_FILE_MARKER).unwrap();
                    prop_assert_eq!(script, format!("{}{}", prelude, shown));
                }
                None => prop_assert_eq!(script.as_str(), cmd.display()),
            }
        }
    }
}
