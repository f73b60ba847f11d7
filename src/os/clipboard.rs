//! The OS-native clipboard behind a small trait.

use crate::error::{CmdError, Result};

pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;
    fn get_text(&self) -> Result<String>;
}

/// The system clipboard. A fresh handle is opened for every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeClipboard;

#[cfg(feature = "native-clipboard")]
impl Clipboard for NativeClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().map_err(CmdError::clipboard)?;
        clipboard.set_text(text).map_err(CmdError::clipboard)
    }

    fn get_text(&self) -> Result<String> {
        let mut clipboard = arboard::Clipboard::new().map_err(CmdError::clipboard)?;
        clipboard.get_text().map_err(CmdError::clipboard)
    }
}

#[cfg(not(feature = "native-clipboard"))]
impl Clipboard for NativeClipboard {
    fn set_text(&self, _text: &str) -> Result<()> {
        Err(CmdError::clipboard(
            "built without the `native-clipboard` feature; set copyToClipboardCmd",
        ))
    }

    fn get_text(&self) -> Result<String> {
        Err(CmdError::clipboard(
            "built without the `native-clipboard` feature; set readFromClipboardCmd",
        ))
    }
}
