// ABOUTME: Terminal layer: the display the bridge writes to and the keystrokes it reads
// Provides the write seam, a stdout-backed raw-mode terminal and key translation

/// Key event translation
pub mod keys;
/// Local tty display
pub mod stdout;

pub use keys::{is_quit_key, key_to_data};
pub use stdout::{RawModeGuard, StdoutTerminal};

use crate::error::Result;

/// Anything the bridge can write display text to
pub trait TerminalSink {
    /// Write `text` to the display as is
    fn write(&mut self, text: &str) -> Result<()>;
}

impl<S: TerminalSink + ?Sized> TerminalSink for &mut S {
    fn write(&mut self, text: &str) -> Result<()> {
        (**self).write(text)
    }
}
