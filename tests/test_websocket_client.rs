// ABOUTME: Integration tests for the Socket.IO transport against a local server
// Covers the namespace handshake, event delivery both ways, reconnection and failures

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use termbridge::socket::{ConnectionState, ReconnectPolicy, WebSocketClient};
use termbridge::{Event, EventChannel};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

const OPEN: &str = r#"0{"sid":"eio-1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

fn fast_policy(max_attempts: u32) -> ReconnectPolicy {
    ReconnectPolicy {
        interval: Duration::from_millis(50),
        max_attempts,
        connect_timeout: Duration::from_secs(3),
    }
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    (listener, url)
}

async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> String {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return text,
            Some(Ok(_)) => continue,
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}

/// Accept one connection and run the Engine.IO open plus namespace join
async fn accept_socketio(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(stream).await.unwrap();
    ws.send(Message::Text(OPEN.to_string())).await.unwrap();
    assert_eq!(next_text(&mut ws).await, "40");
    ws.send(Message::Text(r#"40{"sid":"sock-1"}"#.to_string()))
        .await
        .unwrap();
    ws
}

#[tokio::test]
async fn test_output_events_reach_receiver() {
    let (listener, url) = bind().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_socketio(&listener).await;
        ws.send(Message::Text("not a packet".to_string())).await.unwrap();
        ws.send(Message::Text(
            r#"42["app_output",{"output":"Enter a number: "}]"#.to_string(),
        ))
        .await
        .unwrap();
        // Keep the socket open until the client is done
        while let Some(Ok(_)) = ws.next().await {}
    });

    let client = WebSocketClient::new(&url, fast_policy(0));
    client.connect().await.unwrap();
    assert!(client.is_connected().await);

    let event = tokio::time::timeout(Duration::from_secs(2), client.receive())
        .await
        .unwrap();
    assert_eq!(event, Some(Event::app_output("Enter a number: ")));

    client.disconnect().await;
    server.abort();
}

#[tokio::test]
async fn test_emitted_input_reaches_server() {
    let (listener, url) = bind().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_socketio(&listener).await;
        next_text(&mut ws).await
    });

    let client = WebSocketClient::new(&url, fast_policy(0));
    client.connect().await.unwrap();
    client.emit(Event::app_input("2+2")).unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(2), server)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frame, r#"42["app_input",{"input":"2+2"}]"#);

    client.disconnect().await;
}

#[tokio::test]
async fn test_server_ping_is_answered() {
    let (listener, url) = bind().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_socketio(&listener).await;
        ws.send(Message::Text("2".to_string())).await.unwrap();
        next_text(&mut ws).await
    });

    let client = WebSocketClient::new(&url, fast_policy(0));
    client.connect().await.unwrap();

    let reply = tokio::time::timeout(Duration::from_secs(2), server)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply, "3");

    client.disconnect().await;
}

#[tokio::test]
async fn test_connect_waits_for_late_server() {
    let (listener, url) = bind().await;
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);

    let client = Arc::new(WebSocketClient::new(&url, fast_policy(10)));
    let connecting = {
        let client = client.clone();
        tokio::spawn(async move { client.connect().await })
    };

    // The first attempts are refused; the server comes up afterwards
    tokio::time::sleep(Duration::from_millis(300)).await;
    let listener = TcpListener::bind(addr).await.unwrap();
    let server = tokio::spawn(async move {
        let mut ws = accept_socketio(&listener).await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    let result = connecting.await.unwrap();
    assert!(result.is_ok(), "connect failed: {:?}", result);
    assert!(client.is_connected().await);
    assert_eq!(client.status().await.connections, 1);

    client.disconnect().await;
    server.abort();
}

#[tokio::test]
async fn test_event_emitted_while_disconnected_goes_out_after_reconnect() {
    let (listener, url) = bind().await;

    let server = tokio::spawn(async move {
        let mut first = accept_socketio(&listener).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = first.close(None).await;
        drop(first);

        let mut second = accept_socketio(&listener).await;
        next_text(&mut second).await
    });

    let client = WebSocketClient::new(&url, fast_policy(5));
    client.connect().await.unwrap();

    tokio::time::timeout(Duration::from_secs(2), async {
        while client.is_connected().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    client.emit(Event::app_input("queued")).unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(3), server)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frame, r#"42["app_input",{"input":"queued"}]"#);
    assert_eq!(client.status().await.connections, 2);

    client.disconnect().await;
}

#[tokio::test]
async fn test_receiver_closes_after_server_goes_away() {
    let (listener, url) = bind().await;

    tokio::spawn(async move {
        let mut ws = accept_socketio(&listener).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = ws.close(None).await;
        // listener dropped here, so reconnects are refused
    });

    let client = WebSocketClient::new(&url, fast_policy(1));
    client.connect().await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), client.receive())
        .await
        .unwrap();
    assert_eq!(event, None);
    assert_eq!(client.status().await.state, ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_connect_fails_when_nothing_listens() {
    let (listener, url) = bind().await;
    drop(listener);

    let client = WebSocketClient::new(&url, fast_policy(0));
    assert!(client.connect().await.is_err());
    assert!(!client.is_connected().await);
}

#[tokio::test]
async fn test_refused_namespace_join_fails_connect() {
    let (listener, url) = bind().await;

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text(OPEN.to_string())).await.unwrap();
        let _ = next_text(&mut ws).await;
        ws.send(Message::Text(r#"44{"message":"unauthorized"}"#.to_string()))
            .await
            .unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let client = WebSocketClient::new(&url, fast_policy(0));
    let err = client.connect().await.unwrap_err();
    assert!(err.to_string().contains("unauthorized"), "{err}");
}
