// ABOUTME: Bridge between a terminal display and a backend event channel
// Forwards backend output to the terminal and submits buffered input lines on Enter

/// Pending line and the pure keystroke reducer
pub mod line;

pub use line::{output_effects, Effect, PendingInputLine};

use crate::error::Result;
use crate::socket::EventChannel;
use crate::terminal::TerminalSink;
use tracing::{debug, trace};

/// Wires one terminal to one event channel and owns the pending input line.
///
/// Each instance is an independent session; nothing is shared between bridges.
pub struct InputOutputBridge<T, C> {
    terminal: T,
    channel: C,
    line: PendingInputLine,
}

impl<T: TerminalSink, C: EventChannel> InputOutputBridge<T, C> {
    /// Start a session with an empty pending line
    pub fn new(terminal: T, channel: C) -> Self {
        Self {
            terminal,
            channel,
            line: PendingInputLine::new(),
        }
    }

    /// Write a chunk of backend output to the terminal, unmodified
    pub fn handle_backend_output(&mut self, text: &str) -> Result<()> {
        trace!("Backend output: {} bytes", text.len());
        self.apply(output_effects(text))
    }

    /// Process one input unit produced by the terminal
    pub fn handle_terminal_keystroke(&mut self, data: &str) -> Result<()> {
        let (line, effects) = std::mem::take(&mut self.line).apply(data);
        self.line = line;
        self.apply(effects)
    }

    /// The line typed since the last Enter
    pub fn pending_line(&self) -> &str {
        self.line.as_str()
    }

    /// The terminal this bridge writes to
    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    /// The channel this bridge emits on
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Give back the collaborators, discarding any pending line
    pub fn into_parts(self) -> (T, C) {
        (self.terminal, self.channel)
    }

    fn apply(&mut self, effects: Vec<Effect>) -> Result<()> {
        for effect in effects {
            match effect {
                Effect::Write(text) => self.terminal.write(&text)?,
                Effect::Emit(event) => {
                    debug!("Submitting {}", event.name());
                    self.channel.emit(event)?;
                }
            }
        }
        Ok(())
    }
}
