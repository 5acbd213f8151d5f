//! System clipboard access for click-to-copy.
//!
//! Tries the system clipboard (`arboard`) first. When that is unavailable
//! (no display server, SSH session) the text is sent to the terminal as an
//! OSC 52 escape sequence instead, which most modern terminals forward to
//! their own clipboard.

use std::io::{self, Write};

use base64::Engine;
use log::{debug, warn};

use crate::core::render::CopySink;

/// Clipboard operation errors.
#[derive(Debug)]
pub enum ClipboardError {
    /// System clipboard operation failed.
    System(String),
    /// OSC 52 write failed.
    Osc52(io::Error),
}

impl std::fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClipboardError::System(msg) => write!(f, "system clipboard failed: {msg}"),
            ClipboardError::Osc52(e) => write!(f, "OSC 52 clipboard failed: {e}"),
        }
    }
}

impl std::error::Error for ClipboardError {}

/// `ESC ] 52 ; c ; <base64> ESC \`: `c` selects the system clipboard.
pub fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text);
    format!("\x1b]52;c;{encoded}\x1b\\")
}

fn copy_system(text: &str) -> Result<(), ClipboardError> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| ClipboardError::System(e.to_string()))?;
    clipboard
        .set_text(text)
        .map_err(|e| ClipboardError::System(e.to_string()))
}

fn copy_osc52(text: &str, out: &mut impl Write) -> Result<(), ClipboardError> {
    out.write_all(osc52_sequence(text).as_bytes())
        .and_then(|()| out.flush())
        .map_err(ClipboardError::Osc52)
}

/// The clipboard used by the running TUI.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    /// Copies `text`, falling back to OSC 52 on stdout.
    pub fn copy(&mut self, text: &str) -> Result<(), ClipboardError> {
        match copy_system(text) {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!("{}; falling back to OSC 52", e);
                copy_osc52(text, &mut io::stdout())
            }
        }
    }
}

impl CopySink for SystemClipboard {
    fn copy_to_system_clipboard(&mut self, text: &str) -> bool {
        match self.copy(text) {
            Ok(()) => {
                debug!("Copied {} bytes to clipboard", text.len());
                true
            }
            Err(e) => {
                warn!("Copy failed: {}", e);
                false
            }
        }
    }
}
