// ABOUTME: Socket.IO client carrying bridge events to and from the backend
// Manages connection lifecycle, bounded reconnection and the send/receive queues

use crate::error::{BridgeError, Result};
use crate::socket::protocol::{endpoint_url, Event, Packet};
use crate::socket::EventChannel;
use futures_util::{Sink, SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::time::{sleep, Duration};
use tokio_tungstenite::{connect_async, tungstenite};
use tracing::{debug, error, info, warn};

/// Lifecycle of the backend connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake in progress or waiting to retry
    Connecting,
    /// Joined the default namespace; events flow both ways
    Connected,
    /// Stopped for good, either by `disconnect` or after the last retry
    Disconnected,
    /// The last attempt failed; a retry may follow
    Error,
}

/// Snapshot of the connection, as reported by [`WebSocketClient::status`]
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    /// Current lifecycle state
    pub state: ConnectionState,
    /// Most recent failure, cleared on a successful join
    pub last_error: Option<String>,
    /// Consecutive failed attempts since the last successful join
    pub reconnect_attempts: u32,
    /// Successful joins since `connect` was called
    pub connections: u32,
}

/// How the client retries after a failed or dropped connection
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    /// Delay between attempts
    pub interval: Duration,
    /// Consecutive failures tolerated before giving up
    pub max_attempts: u32,
    /// How long `connect` waits for the first join
    pub connect_timeout: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 10,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Outgoing events for one connection.
///
/// An event whose send failed is parked in `retry` and goes out first on the
/// next connection, ahead of anything queued after it.
struct Outbox<'a> {
    retry: &'a mut Option<Event>,
    queue: &'a mut mpsc::UnboundedReceiver<Event>,
}

impl Outbox<'_> {
    async fn next(&mut self) -> Option<Event> {
        if let Some(event) = self.retry.take() {
            return Some(event);
        }
        self.queue.recv().await
    }

    fn requeue(&mut self, event: Event) {
        *self.retry = Some(event);
    }
}

/// Socket.IO client for one backend
pub struct WebSocketClient {
    /// Engine.IO WebSocket endpoint
    url: String,

    /// Current connection status
    status: Arc<RwLock<ConnectionStatus>>,

    /// Events queued for the backend
    tx_sender: mpsc::UnboundedSender<Event>,
    tx_receiver: Arc<Mutex<mpsc::UnboundedReceiver<Event>>>,

    /// Events received from the backend. The sender moves into the
    /// connection loop so the queue closes when the loop ends.
    rx_sender: Mutex<Option<mpsc::UnboundedSender<Event>>>,
    rx_receiver: Mutex<mpsc::UnboundedReceiver<Event>>,

    policy: ReconnectPolicy,

    /// Task handle for the connection loop
    connection_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl WebSocketClient {
    /// Create a client for a server URL such as `ws://127.0.0.1:5000`.
    /// Nothing is connected until [`connect`](Self::connect).
    pub fn new(url: &str, policy: ReconnectPolicy) -> Self {
        let (tx_sender, tx_receiver) = mpsc::unbounded_channel();
        let (rx_sender, rx_receiver) = mpsc::unbounded_channel();

        Self {
            url: endpoint_url(url),
            status: Arc::new(RwLock::new(ConnectionStatus {
                state: ConnectionState::Disconnected,
                last_error: None,
                reconnect_attempts: 0,
                connections: 0,
            })),
            tx_sender,
            tx_receiver: Arc::new(Mutex::new(tx_receiver)),
            rx_sender: Mutex::new(Some(rx_sender)),
            rx_receiver: Mutex::new(rx_receiver),
            policy,
            connection_handle: Mutex::new(None),
        }
    }

    /// The Engine.IO endpoint this client connects to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Start the connection loop and wait for the first join.
    ///
    /// Failed attempts are retried under the policy; this only fails once
    /// the loop gives up or `connect_timeout` passes.
    pub async fn connect(&self) -> Result<()> {
        info!("Starting Socket.IO connection to {}", self.url);

        let rx_sender = self
            .rx_sender
            .lock()
            .await
            .take()
            .ok_or_else(|| BridgeError::Connection("client already started".to_string()))?;

        {
            let mut status = self.status.write().await;
            status.state = ConnectionState::Connecting;
            status.reconnect_attempts = 0;
            status.connections = 0;
        }

        let handle = self.spawn_connection_loop(rx_sender);
        *self.connection_handle.lock().await = Some(handle);

        let wait = tokio::time::timeout(self.policy.connect_timeout, async {
            loop {
                let status = self.status.read().await.clone();
                if status.connections > 0 {
                    info!("Socket.IO connection established");
                    return Ok(());
                }
                if status.state == ConnectionState::Disconnected {
                    let reason = status
                        .last_error
                        .unwrap_or_else(|| "connection closed".to_string());
                    return Err(BridgeError::Connection(reason));
                }
                sleep(Duration::from_millis(50)).await;
            }
        });

        let result = match wait.await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Socket.IO connection timeout after {:?}",
                    self.policy.connect_timeout
                );
                Err(BridgeError::Connection("connection timeout".to_string()))
            }
        };

        if result.is_err() {
            self.disconnect().await;
        }
        result
    }

    fn spawn_connection_loop(
        &self,
        rx_sender: mpsc::UnboundedSender<Event>,
    ) -> tokio::task::JoinHandle<()> {
        let url = self.url.clone();
        let status = self.status.clone();
        let tx_receiver = self.tx_receiver.clone();
        let policy = self.policy;

        tokio::spawn(async move {
            let mut retry: Option<Event> = None;

            loop {
                match Self::connection_handler(
                    &url,
                    status.clone(),
                    tx_receiver.clone(),
                    &rx_sender,
                    &mut retry,
                )
                .await
                {
                    Ok(()) => info!("Socket.IO connection closed"),
                    Err(e) => {
                        error!("Socket.IO connection error: {}", e);
                        let mut status_guard = status.write().await;
                        status_guard.state = ConnectionState::Error;
                        status_guard.last_error = Some(e.to_string());
                    }
                }

                let should_reconnect = {
                    let mut status_guard = status.write().await;
                    if status_guard.reconnect_attempts >= policy.max_attempts {
                        warn!("Max reconnection attempts reached");
                        status_guard.state = ConnectionState::Disconnected;
                        false
                    } else {
                        status_guard.reconnect_attempts += 1;
                        if status_guard.state != ConnectionState::Error {
                            status_guard.state = ConnectionState::Connecting;
                        }
                        true
                    }
                };

                if !should_reconnect {
                    if retry.is_some() {
                        warn!("Dropping unsent event after giving up");
                    }
                    break;
                }

                sleep(policy.interval).await;
                status.write().await.state = ConnectionState::Connecting;
                info!("Attempting to reconnect...");
            }
        })
    }

    /// Handle a single connection until it closes or fails
    async fn connection_handler(
        url: &str,
        status: Arc<RwLock<ConnectionStatus>>,
        tx_receiver: Arc<Mutex<mpsc::UnboundedReceiver<Event>>>,
        rx_sender: &mpsc::UnboundedSender<Event>,
        retry: &mut Option<Event>,
    ) -> Result<()> {
        debug!("Attempting WebSocket handshake with {}", url);

        let (ws_stream, response) = connect_async(url)
            .await
            .map_err(|e| BridgeError::Connection(e.to_string()))?;

        debug!("WebSocket response status: {:?}", response.status());

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let mut tx_guard = tx_receiver.lock().await;
        let mut outbox = Outbox {
            retry,
            queue: &mut *tx_guard,
        };

        // Events are held back until the server acknowledges the namespace join
        let mut joined = false;

        loop {
            tokio::select! {
                Some(event) = outbox.next(), if joined => {
                    let frame = event.to_frame()?;
                    if let Err(e) = Self::send_text(&mut ws_sender, frame).await {
                        outbox.requeue(event);
                        return Err(e);
                    }
                    debug!("Sent event: {}", event.name());
                }

                ws_msg = ws_receiver.next() => {
                    let text = match ws_msg {
                        Some(Ok(tungstenite::Message::Text(text))) => text,
                        Some(Ok(tungstenite::Message::Close(_))) => {
                            info!("WebSocket closed by server");
                            return Ok(());
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => return Err(BridgeError::Connection(e.to_string())),
                        None => {
                            info!("WebSocket stream ended");
                            return Ok(());
                        }
                    };

                    match Packet::parse(&text) {
                        Ok(Packet::Open(handshake)) => {
                            debug!("Engine.IO open: {}", handshake);
                            Self::send_text(&mut ws_sender, Packet::Connect.encode()?).await?;
                        }
                        Ok(Packet::Connect) => {
                            joined = true;
                            let mut status_guard = status.write().await;
                            status_guard.state = ConnectionState::Connected;
                            status_guard.last_error = None;
                            status_guard.reconnect_attempts = 0;
                            status_guard.connections += 1;
                            info!("Joined default namespace at {}", url);
                        }
                        Ok(Packet::Ping(data)) => {
                            Self::send_text(&mut ws_sender, Packet::Pong(data).encode()?).await?;
                        }
                        Ok(Packet::Event(event)) => {
                            debug!("Received event: {}", event.name());
                            if rx_sender.send(event).is_err() {
                                warn!("Receive queue dropped, ending connection");
                                return Ok(());
                            }
                        }
                        Ok(Packet::Close | Packet::Disconnect) => {
                            info!("Disconnected by server");
                            return Ok(());
                        }
                        Ok(Packet::ConnectError(reason)) => {
                            return Err(BridgeError::Connection(format!(
                                "namespace join refused: {reason}"
                            )));
                        }
                        Ok(Packet::Pong(_) | Packet::Noop) => {}
                        Err(e) => warn!("Failed to parse frame: {}", e),
                    }
                }
            }
        }
    }

    async fn send_text<S>(sink: &mut S, frame: String) -> Result<()>
    where
        S: Sink<tungstenite::Message, Error = tungstenite::Error> + Unpin,
    {
        sink.send(tungstenite::Message::Text(frame))
            .await
            .map_err(|e| BridgeError::Connection(e.to_string()))
    }

    /// Queue an event for the backend.
    ///
    /// Events queued while disconnected go out after the next join.
    pub fn send(&self, event: Event) -> Result<()> {
        self.tx_sender
            .send(event)
            .map_err(|_| BridgeError::ChannelClosed)
    }

    /// Next event from the backend; `None` once the client has given up
    pub async fn receive(&self) -> Option<Event> {
        self.rx_receiver.lock().await.recv().await
    }

    /// Current connection status
    pub async fn status(&self) -> ConnectionStatus {
        self.status.read().await.clone()
    }

    /// Whether the namespace is currently joined
    pub async fn is_connected(&self) -> bool {
        self.status.read().await.state == ConnectionState::Connected
    }

    /// Stop the connection loop and close the receive queue
    pub async fn disconnect(&self) {
        info!("Disconnecting Socket.IO client");

        {
            let mut status = self.status.write().await;
            status.state = ConnectionState::Disconnected;
            status.reconnect_attempts = self.policy.max_attempts;
        }

        if let Some(handle) = self.connection_handle.lock().await.take() {
            handle.abort();
        }
    }
}

impl EventChannel for WebSocketClient {
    fn emit(&self, event: Event) -> Result<()> {
        self.send(event)
    }
}
