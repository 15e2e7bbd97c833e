// ABOUTME: Wire protocol for the event channel between the bridge and its backend
// Socket.IO v5 packets over an Engine.IO v4 WebSocket, as spoken by Flask-SocketIO

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};

/// Engine.IO endpoint appended to a bare server URL
pub const ENGINE_IO_PATH: &str = "/socket.io/?EIO=4&transport=websocket";

/// Full WebSocket endpoint for a server URL such as `ws://127.0.0.1:5000`.
///
/// URLs that already point at `/socket.io/` are used as given.
pub fn endpoint_url(base: &str) -> String {
    if base.contains("/socket.io/") {
        return base.to_string();
    }
    format!("{}{}", base.trim_end_matches('/'), ENGINE_IO_PATH)
}

// ============================================
// Events
// ============================================

/// A named event exchanged with the backend.
///
/// On the wire: `42["app_output",{"output":"..."}]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Backend → Client
    /// Text produced by the backend program
    AppOutput(AppOutputPayload),

    // Client → Backend
    /// A submitted input line
    AppInput(AppInputPayload),
}

/// Payload of `app_output`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppOutputPayload {
    /// Output chunk, written to the terminal verbatim
    pub output: String,
}

/// Payload of `app_input`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInputPayload {
    /// The line typed before Enter, without the line terminator
    pub input: String,
}

impl Event {
    /// Create an `app_output` event
    pub fn app_output(output: impl Into<String>) -> Self {
        Event::AppOutput(AppOutputPayload {
            output: output.into(),
        })
    }

    /// Create an `app_input` event
    pub fn app_input(input: impl Into<String>) -> Self {
        Event::AppInput(AppInputPayload {
            input: input.into(),
        })
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Event::AppOutput(_) => "app_output",
            Event::AppInput(_) => "app_input",
        }
    }

    /// Whether this event flows from the backend to the client
    pub fn is_output(&self) -> bool {
        matches!(self, Event::AppOutput(_))
    }

    /// Encode as a Socket.IO EVENT packet in one text frame
    pub fn to_frame(&self) -> Result<String> {
        Ok(format!("42{}", self.to_args()?))
    }

    /// Decode a text frame that must hold an EVENT packet
    pub fn from_frame(text: &str) -> Result<Self> {
        match Packet::parse(text)? {
            Packet::Event(event) => Ok(event),
            other => Err(BridgeError::Frame(format!(
                "expected an event packet, got {:?}",
                other
            ))),
        }
    }

    /// The `[name, payload]` argument array
    fn to_args(&self) -> Result<String> {
        let args = match self {
            Event::AppOutput(payload) => serde_json::to_string(&(self.name(), payload))?,
            Event::AppInput(payload) => serde_json::to_string(&(self.name(), payload))?,
        };
        Ok(args)
    }

    fn from_args(json: &str) -> Result<Self> {
        let (name, data): (String, serde_json::Value) = serde_json::from_str(json)?;
        match name.as_str() {
            "app_output" => Ok(Event::AppOutput(serde_json::from_value(data)?)),
            "app_input" => Ok(Event::AppInput(serde_json::from_value(data)?)),
            other => Err(BridgeError::Frame(format!("unknown event {other:?}"))),
        }
    }
}

// ============================================
// Packets
// ============================================

/// One Engine.IO packet, with Socket.IO packets on the default namespace unpacked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Engine.IO OPEN with the handshake JSON
    Open(String),
    /// Engine.IO CLOSE
    Close,
    /// Engine.IO PING; the server expects a PONG with the same data
    Ping(String),
    /// Engine.IO PONG
    Pong(String),
    /// Engine.IO NOOP
    Noop,
    /// Socket.IO CONNECT: request from the client, acknowledgement from the server
    Connect,
    /// Socket.IO DISCONNECT
    Disconnect,
    /// Socket.IO EVENT
    Event(Event),
    /// Socket.IO CONNECT_ERROR with the server's reason
    ConnectError(String),
}

impl Packet {
    /// Parse one text frame
    pub fn parse(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        let kind = chars
            .next()
            .ok_or_else(|| BridgeError::Frame("empty frame".to_string()))?;
        let rest = chars.as_str();

        match kind {
            '0' => Ok(Packet::Open(rest.to_string())),
            '1' => Ok(Packet::Close),
            '2' => Ok(Packet::Ping(rest.to_string())),
            '3' => Ok(Packet::Pong(rest.to_string())),
            '4' => Self::parse_socket(rest),
            '6' => Ok(Packet::Noop),
            other => Err(BridgeError::Frame(format!(
                "unknown engine.io packet type {other:?}"
            ))),
        }
    }

    fn parse_socket(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        let kind = chars
            .next()
            .ok_or_else(|| BridgeError::Frame("empty socket.io packet".to_string()))?;
        let body = chars.as_str();

        if body.starts_with('/') {
            return Err(BridgeError::Frame(format!(
                "packet for another namespace: {body}"
            )));
        }

        match kind {
            '0' => Ok(Packet::Connect),
            '1' => Ok(Packet::Disconnect),
            // An ack id may sit between the type and the argument array
            '2' => Ok(Packet::Event(Event::from_args(
                body.trim_start_matches(|c: char| c.is_ascii_digit()),
            )?)),
            '4' => Ok(Packet::ConnectError(body.to_string())),
            other => Err(BridgeError::Frame(format!(
                "unsupported socket.io packet type {other:?}"
            ))),
        }
    }

    /// Encode as one text frame
    pub fn encode(&self) -> Result<String> {
        let frame = match self {
            Packet::Open(handshake) => format!("0{handshake}"),
            Packet::Close => "1".to_string(),
            Packet::Ping(data) => format!("2{data}"),
            Packet::Pong(data) => format!("3{data}"),
            Packet::Noop => "6".to_string(),
            Packet::Connect => "40".to_string(),
            Packet::Disconnect => "41".to_string(),
            Packet::Event(event) => event.to_frame()?,
            Packet::ConnectError(reason) => format!("44{reason}"),
        };
        Ok(frame)
    }
}
