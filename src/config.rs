//! Settings the host application hands to the OS facade.

use std::path::PathBuf;

use serde::Deserialize;

/// OS-related user settings. Empty strings mean "not configured".
///
/// Deserializes from camelCase keys with every field optional, e.g.
///
/// ```yaml
/// shellFunctionsFile: ~/.config/funcs.sh
/// copyToClipboardCmd: printf '%s' {{text}} | xclip -selection clipboard
/// readFromClipboardCmd: xclip -o -selection clipboard
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OsConfig {
    /// Sourced before every shell command.
    pub shell_functions_file: String,
    /// Template with a `{{text}}` placeholder.
    pub copy_to_clipboard_cmd: String,
    pub read_from_clipboard_cmd: String,
    /// Template with a `{{filename}}` placeholder; the platform default when empty.
    pub open: String,
    /// Template with a `{{link}}` placeholder; the platform default when empty.
    pub open_link: String,
    pub temp_dir: PathBuf,
    /// Appended to the window title as `<dir> - <suffix>`.
    pub window_title_suffix: String,
}

impl Default for OsConfig {
    fn default() -> Self {
        OsConfig {
            shell_functions_file: String::new(),
            copy_to_clipboard_cmd: String::new(),
            read_from_clipboard_cmd: String::new(),
            open: String::new(),
            open_link: String::new(),
            temp_dir: std::env::temp_dir(),
            window_title_suffix: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let cfg: OsConfig = serde_yaml::from_str(
            "copyToClipboardCmd: \"pbcopy < {{text}}\"\nopenLink: \"firefox {{link}}\"\ntempDir: /scratch\n",
        )
        .unwrap();
        assert_eq!(cfg.copy_to_clipboard_cmd, "pbcopy < {{text}}");
        assert_eq!(cfg.open_link, "firefox {{link}}");
        assert_eq!(cfg.temp_dir, PathBuf::from("/scratch"));
        assert!(cfg.open.is_empty());
        assert!(cfg.shell_functions_file.is_empty());
    }

    #[test]
    fn default_temp_dir_is_the_system_one() {
        assert_eq!(OsConfig::default().temp_dir, std::env::temp_dir());
    }
}
