//! Socket tests against a real listener, since `axum-test` cannot upgrade
//! connections.

use std::{net::SocketAddr, time::Duration};

use futures::{SinkExt, StreamExt};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message,
};

use crate::{
    config::create_app,
    live::relay::PREFIX,
    state::AppState,
    test::make_test_state,
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

/// Polls `$cond` until it holds, failing the test if it never does.
macro_rules! wait_until {
    ($cond:expr) => {{
        let deadline = tokio::time::Instant::now() + WAIT;
        loop {
            if $cond {
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for `{}`",
                stringify!($cond)
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }};
}

async fn spawn_server() -> (SocketAddr, AppState) {
    let state = make_test_state();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn connect(addr: SocketAddr, path: &str) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}{path}")).await.unwrap();
    client
}

async fn next_text(client: &mut Client) -> String {
    loop {
        let msg = timeout(WAIT, client.next())
            .await
            .expect("no message arrived")
            .expect("socket ended")
            .unwrap();
        match msg {
            Message::Text(_) => return msg.to_text().unwrap().to_string(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("expected text, got {other:?}"),
        }
    }
}

async fn send(client: &mut Client, text: &str) {
    client.send(Message::text(text.to_string())).await.unwrap();
}

/// Fails if a text frame arrives before the socket finishes closing.
async fn no_text(client: &mut Client) {
    let _ = timeout(Duration::from_millis(200), async {
        while let Some(msg) = client.next().await {
            match msg {
                Ok(Message::Text(text)) => panic!("unexpected text {text:?}"),
                Ok(Message::Close(_)) | Err(_) => return,
                Ok(_) => {}
            }
        }
    })
    .await;
}

/// Waits for the server to close the socket.
async fn closed(client: &mut Client) {
    timeout(WAIT, async {
        while let Some(msg) = client.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => return,
                Ok(_) => {}
            }
        }
    })
    .await
    .expect("socket was not closed");
}

#[tokio::test]
async fn relay_reaches_everyone_still_connected() {
    let (addr, state) = spawn_server().await;

    let mut a = connect(addr, "/ws/notify").await;
    let mut b = connect(addr, "/ws/notify").await;
    let mut c = connect(addr, "/ws/notify").await;
    wait_until!(state.relay.len().await == 3);

    send(&mut a, "hi").await;
    for client in [&mut a, &mut b, &mut c] {
        assert_eq!(next_text(client).await, format!("{PREFIX}hi"));
    }

    b.close(None).await.unwrap();
    wait_until!(state.relay.len().await == 2);

    send(&mut a, "yo").await;
    assert_eq!(next_text(&mut a).await, "Message: yo");
    assert_eq!(next_text(&mut c).await, "Message: yo");
    no_text(&mut b).await;
    assert_eq!(state.relay.len().await, 2);
}

#[tokio::test]
async fn chat_is_passed_on_verbatim() {
    let (addr, state) = spawn_server().await;

    let mut x = connect(addr, "/ws/chat").await;
    let mut y = connect(addr, "/ws/chat").await;
    wait_until!(state.chat.len().await == 2);

    send(&mut x, "hello").await;
    assert_eq!(next_text(&mut x).await, "hello");
    assert_eq!(next_text(&mut y).await, "hello");

    send(&mut y, "one").await;
    send(&mut y, "two").await;
    for client in [&mut x, &mut y] {
        assert_eq!(next_text(client).await, "one");
        assert_eq!(next_text(client).await, "two");
    }
}

#[tokio::test]
async fn chat_and_relay_are_separate() {
    let (addr, state) = spawn_server().await;

    let mut chatter = connect(addr, "/ws/chat").await;
    let mut listener = connect(addr, "/ws/notify").await;
    wait_until!(state.chat.len().await == 1 && state.relay.len().await == 1);

    send(&mut chatter, "psst").await;
    assert_eq!(next_text(&mut chatter).await, "psst");

    // the relay client only sees its own traffic
    send(&mut listener, "ping").await;
    assert_eq!(next_text(&mut listener).await, "Message: ping");
}

#[tokio::test]
async fn closing_sockets_disconnects_clients() {
    let (addr, state) = spawn_server().await;

    let mut chatter = connect(addr, "/ws/chat").await;
    let mut listener = connect(addr, "/ws/notify").await;
    wait_until!(state.chat.len().await == 1 && state.relay.len().await == 1);

    state.close_sockets().await;

    closed(&mut chatter).await;
    closed(&mut listener).await;
    assert!(state.chat.is_empty().await);
    assert!(state.relay.is_empty().await);
}
