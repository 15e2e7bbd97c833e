// ABOUTME: Local tty implementation of the terminal display
// Raw mode is held by a guard so the shell gets a sane terminal back on exit

use crate::error::Result;
use crate::terminal::TerminalSink;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, is_raw_mode_enabled};
use std::io::{self, Write};
use tracing::{debug, warn};

/// Writes display text to any `io::Write`, flushing after each chunk
pub struct StdoutTerminal<W: Write = io::Stdout> {
    out: W,
}

impl StdoutTerminal<io::Stdout> {
    /// Terminal on the process's stdout
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for StdoutTerminal<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> StdoutTerminal<W> {
    /// Terminal on an arbitrary writer
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    /// Give back the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TerminalSink for StdoutTerminal<W> {
    fn write(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Enables raw mode for its lifetime.
///
/// In raw mode the tty neither echoes nor line-buffers, so every keystroke
/// reaches the bridge and all echo comes from the bridge itself.
pub struct RawModeGuard {
    was_enabled: bool,
}

impl RawModeGuard {
    /// Enable raw mode unless it already is
    pub fn enable() -> Result<Self> {
        let was_enabled = is_raw_mode_enabled()?;
        if !was_enabled {
            enable_raw_mode()?;
            debug!("Raw mode enabled");
        }
        Ok(Self { was_enabled })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if !self.was_enabled {
            if let Err(e) = disable_raw_mode() {
                warn!("Failed to restore terminal mode: {}", e);
            }
        }
    }
}
