//! Platform quoting and human-readable rendering of commands.

use crate::cmd::CmdObj;
use crate::error::{CmdError, Result};

/// Whether quoting may refuse input the target shell cannot carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuotePolicy {
    Strict,
    #[default]
    Loose,
}

pub trait Renderer: Send + Sync {
    /// Wrap `s` so the shell sees it as exactly one argument.
    fn quote(&self, s: &str) -> String;

    /// Reject characters this shell's quoting cannot represent.
    fn check(&self, s: &str) -> Result<()>;

    /// Quote only when `s` is not a plain word; used for display rendering.
    fn quote_word(&self, s: &str) -> String;

    fn quote_checked(&self, s: &str, policy: QuotePolicy) -> Result<String> {
        if policy == QuotePolicy::Strict {
            self.check(s)?;
        }
        Ok(self.quote(s))
    }

    fn render_argv(&self, argv: &[String]) -> String {
        argv.iter().map(|a| self.quote_word(a)).collect::<Vec<_>>().join(" ")
    }
}

/// One log line for a whole pipeline: each stage's display joined by `" | "`.
pub fn render_pipe(cmds: &[CmdObj]) -> String {
    cmds.iter().map(CmdObj::display).collect::<Vec<_>>().join(" | ")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PosixRenderer;

impl Renderer for PosixRenderer {
    fn quote(&self, s: &str) -> String {
        quote_sh(s)
    }

    fn check(&self, s: &str) -> Result<()> {
        reject_nul(s)
    }

    fn quote_word(&self, s: &str) -> String {
        if !s.is_empty() && is_simple_word(s) { s.to_string() } else { quote_sh(s) }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WinRenderer;

impl Renderer for WinRenderer {
    fn quote(&self, s: &str) -> String {
        quote_win(s)
    }

    fn check(&self, s: &str) -> Result<()> {
        reject_nul(s)?;
        if s.contains(['\r', '\n']) {
            return Err(CmdError::Quote {
                input: s.to_string(),
                reason: "cmd.exe cannot carry line breaks inside an argument".into(),
            });
        }
        Ok(())
    }

    /// Argv reaches the child through std's MSVC command-line escaping, not
    /// through cmd.exe, so the display follows those rules.
    fn quote_word(&self, s: &str) -> String {
        quote_msvc_arg(s)
    }
}

impl WinRenderer {
    /// Caret-escape cmd.exe operators in text handed unquoted to a builtin
    /// such as `title`. Line breaks become spaces.
    pub fn escape_caret(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '^' | '&' | '|' | '<' | '>' | '(' | ')' | '%' => {
                    out.push('^');
                    out.push(c);
                }
                '\r' | '\n' => out.push(' '),
                _ => out.push(c),
            }
        }
        out
    }
}

fn reject_nul(s: &str) -> Result<()> {
    if s.contains('\0') {
        return Err(CmdError::Quote {
            input: s.to_string(),
            reason: "NUL bytes cannot be passed to a process".into(),
        });
    }
    Ok(())
}

fn is_simple_word(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric() || "_-./:+%@=,".contains(c))
}

fn quote_sh(s: &str) -> String {
    if s.is_empty() { return "''".to_string(); }
    let escaped = s.replace('\'', "'\"'\"'");
    format!("'{}'", escaped)
}

/// One argument as `CommandLineToArgvW` expects it: quoted only when empty or
/// holding blanks, `"` as `\"`, and backslashes doubled ahead of a quote.
fn quote_msvc_arg(s: &str) -> String {
    let quoted = s.is_empty() || s.contains([' ', '\t']);
    let mut out = String::with_capacity(s.len() + 2);
    if quoted {
        out.push('"');
    }
    let mut backslashes = 0;
    for c in s.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                out.extend(std::iter::repeat_n('\\', backslashes + 1));
                backslashes = 0;
            }
            _ => backslashes = 0,
        }
        out.push(c);
    }
    if quoted {
        out.extend(std::iter::repeat_n('\\', backslashes));
        out.push('"');
    }
    out
}

fn quote_win(s: &str) -> String {
    // `%` is emitted outside the quotes as `^%` so cmd.exe does not expand it
    let escaped = s.replace('"', "\"\"").replace('%', "\"^%\"");
    format!("\"{}\"", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn quote_sh_basic() {
        assert_eq!(quote_sh(""), "''");
        assert_eq!(quote_sh("hello"), "'hello'");
        assert_eq!(quote_sh("my file.txt"), "'my file.txt'");
        assert_eq!(quote_sh("foo'bar"), "'foo'\"'\"'bar'");
    }

    #[test]
    fn quote_win_escapes_quotes_and_percent() {
        assert_eq!(quote_win("my file.txt"), "\"my file.txt\"");
        assert_eq!(quote_win("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_win("100%"), "\"100\"^%\"\"");
    }

    #[test]
    fn render_argv_quotes_only_when_needed() {
        let argv: Vec<String> = vec!["git".into(), "commit".into(), "-m".into(), "fix it".into()];
        assert_eq!(PosixRenderer.render_argv(&argv), "git commit -m 'fix it'");
        assert_eq!(WinRenderer.render_argv(&argv), "git commit -m \"fix it\"");
    }

    #[test]
    fn windows_argv_display_uses_msvc_escaping() {
        let argv: Vec<String> = vec!["echo".into(), "a\"b".into(), "".into(), "C:\\dir with space\\".into(), "x\\\"y".into()];
        assert_eq!(WinRenderer.render_argv(&argv), r#"echo a\"b "" "C:\dir with space\\" x\\\"y"#);
    }

    #[test]
    fn escape_caret_neutralizes_cmd_operators() {
        assert_eq!(WinRenderer::escape_caret("repo & del important.txt"), "repo ^& del important.txt");
        assert_eq!(WinRenderer::escape_caret("a|b<c>d(e)^f%PATH%"), "a^|b^<c^>d^(e^)^^f^%PATH^%");
        assert_eq!(WinRenderer::escape_caret("two\r\nlines"), "two  lines");
        assert_eq!(WinRenderer::escape_caret("plain-name"), "plain-name");
    }

    #[test]
    fn strict_policy_rejects_line_breaks_on_windows_only() {
        assert!(WinRenderer.quote_checked("a\nb", QuotePolicy::Strict).is_err());
        assert!(WinRenderer.quote_checked("a\nb", QuotePolicy::Loose).is_ok());
        assert_eq!(PosixRenderer.quote_checked("a\nb", QuotePolicy::Strict).unwrap(), "'a\nb'");
    }

    #[test]
    fn strict_policy_rejects_nul_everywhere() {
        let err = PosixRenderer.quote_checked("a\0b", QuotePolicy::Strict).unwrap_err();
        assert!(matches!(err, CmdError::Quote { .. }));
        assert!(WinRenderer.quote_checked("a\0b", QuotePolicy::Strict).is_err());
    }

    #[cfg(unix)]
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Property: the shell reads a quoted string back as the original text
        #[test]
        fn posix_quote_round_trips_through_sh(input in "[ -~]{0,24}") {
            let out = std::process::Command::new("sh")
                .arg("-c")
                .arg(format!("printf '%s' {}", quote_sh(&input)))
                .output()
                .unwrap();
            prop_assert_eq!(String::from_utf8_lossy(&out.stdout).to_string(), input);
        }
    }
}
