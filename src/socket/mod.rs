// ABOUTME: Socket layer connecting the bridge to its backend
// Defines the emit seam and the WebSocket transport behind it

/// Socket.IO packets and bridge events
pub mod protocol;
/// Socket.IO client over WebSocket
pub mod websocket_client;

pub use protocol::{AppInputPayload, AppOutputPayload, Event};
pub use websocket_client::{ConnectionState, ConnectionStatus, ReconnectPolicy, WebSocketClient};

use crate::error::Result;

/// Outbound half of a socket channel.
///
/// `emit` queues the event and returns without waiting for delivery.
pub trait EventChannel {
    /// Queue `event` for delivery to the backend
    fn emit(&self, event: Event) -> Result<()>;
}

impl<C: EventChannel + ?Sized> EventChannel for std::sync::Arc<C> {
    fn emit(&self, event: Event) -> Result<()> {
        (**self).emit(event)
    }
}
