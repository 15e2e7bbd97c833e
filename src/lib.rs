// ABOUTME: Library crate for termbridge exposing the bridge, terminal and socket layers
// The binary in main.rs wires these together; tests use them directly

//! Line-buffered bridge between a terminal and a Socket.IO backend.

/// Pending input line and the bridge that owns it
pub mod bridge;
/// Layered configuration
pub mod config;
/// Error taxonomy
pub mod error;
/// Event channel and its Socket.IO transport
pub mod socket;
/// Terminal display and key input
pub mod terminal;

pub use bridge::{Effect, InputOutputBridge, PendingInputLine};
pub use error::{BridgeError, Result};
pub use socket::{protocol::Event, EventChannel};
pub use terminal::TerminalSink;
