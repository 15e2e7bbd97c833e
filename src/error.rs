// ABOUTME: Error types for the terminal bridge
// Collaborator failures surfaced by the bridge, transport and configuration

use thiserror::Error;

/// Errors produced by the bridge and its collaborators
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Terminal write, flush or mode change failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport task is gone and can no longer take events
    #[error("Event channel closed")]
    ChannelClosed,

    /// Handshake or stream failure
    #[error("Connection failed: {0}")]
    Connection(String),

    /// JSON payload could not be encoded or decoded
    #[error("Protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    /// A frame that is not a packet this client understands
    #[error("Malformed frame: {0}")]
    Frame(String),

    /// Unreadable or invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, BridgeError>;
