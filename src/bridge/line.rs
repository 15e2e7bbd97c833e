// ABOUTME: Pending input line and the pure keystroke reducer behind the bridge
// Maps (line, input unit) to (line, effects) without touching any collaborator

use crate::socket::protocol::Event;

/// Carriage return, sent by the terminal when Enter is pressed
pub const ENTER: &str = "\r";

/// DEL, sent by the terminal when Backspace is pressed
pub const BACKSPACE: &str = "\u{7f}";

/// Written to the terminal after Enter
pub const NEWLINE: &str = "\r\n";

/// Moves the cursor back, blanks the cell, moves back again
pub const ERASE: &str = "\u{8} \u{8}";

/// A side effect requested by the reducer, applied in order by the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write text to the terminal display
    Write(String),
    /// Send an event to the backend
    Emit(Event),
}

/// Keystrokes typed since the last Enter, minus those erased by backspace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingInputLine {
    buffer: String,
}

impl PendingInputLine {
    /// An empty line
    pub fn new() -> Self {
        Self::default()
    }

    /// The buffered text
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Whether nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Process one input unit from the terminal.
    ///
    /// Enter flushes the line as `app_input`, DEL erases the last character
    /// (nothing at all on an empty line), anything else is echoed and kept.
    pub fn apply(mut self, data: &str) -> (Self, Vec<Effect>) {
        let effects = match data {
            ENTER => {
                let line = std::mem::take(&mut self.buffer);
                vec![
                    Effect::Write(NEWLINE.to_string()),
                    Effect::Emit(Event::app_input(line)),
                ]
            }
            BACKSPACE => match self.buffer.pop() {
                Some(_) => vec![Effect::Write(ERASE.to_string())],
                None => Vec::new(),
            },
            _ => {
                self.buffer.push_str(data);
                vec![Effect::Write(data.to_string())]
            }
        };

        (self, effects)
    }
}

/// Effects for a chunk of backend output: written verbatim
pub fn output_effects(text: &str) -> Vec<Effect> {
    vec![Effect::Write(text.to_string())]
}
