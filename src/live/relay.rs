//! `/ws/notify`: every text message a client sends is echoed, prefixed with
//! `"Message: "`, to every connected client (the sender included).

use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};

use crate::live::{Connection, ConnectionId, ConnectionList, serve_socket};

pub const PREFIX: &str = "Message: ";

#[derive(Clone, Default)]
pub struct RelayRegistry {
    connections: ConnectionList,
}

impl RelayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn accept(&self, connection: Connection) {
        tracing::debug!(connection = %connection.id(), "relay connection accepted");
        self.connections.push(connection).await;
    }

    /// Relays `text` to every registered connection. Returns the number of
    /// connections it was queued for.
    pub async fn on_message(&self, text: &str) -> usize {
        self.connections.sweep(&format!("{PREFIX}{text}")).await
    }

    /// Forgets the connection. Unknown connections are ignored.
    pub async fn on_disconnect(&self, id: ConnectionId) {
        if self.connections.remove(id).await {
            tracing::debug!(connection = %id, "relay connection closed");
        }
    }

    pub async fn len(&self) -> usize {
        self.connections.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn close_all(&self) -> usize {
        self.connections.clear().await
    }
}

pub async fn notify_socket(
    ws: WebSocketUpgrade,
    State(relay): State<RelayRegistry>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let (connection, outbound) = Connection::open();
        let id = connection.id();
        relay.accept(connection).await;

        let relay1 = relay.clone();
        serve_socket(socket, outbound, move |text| {
            let relay = relay1.clone();
            async move {
                relay.on_message(&text).await;
            }
        })
        .await;

        relay.on_disconnect(id).await;
    })
}
