//! `/ws/chat`: a chat room. Messages are passed on verbatim to every client
//! in the room, including whoever sent them.

use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};

use crate::live::{Connection, ConnectionId, ConnectionList, serve_socket};

#[derive(Clone, Default)]
pub struct ChatBroadcaster {
    active_connections: ConnectionList,
}

impl ChatBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection whose websocket handshake has completed.
    pub async fn connect(&self, connection: Connection) {
        let id = connection.id();
        self.active_connections.push(connection).await;
        tracing::info!(connection = %id, "chat connection opened");
    }

    /// Removes a connection, returning whether it was present. A socket
    /// dropped by [`ChatBroadcaster::close_all`] reaches here after it has
    /// already been removed.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.active_connections.remove(id).await;
        if removed {
            tracing::info!(connection = %id, "chat connection closed");
        } else {
            tracing::debug!(connection = %id, "chat connection was already removed");
        }
        removed
    }

    /// Returns the number of connections the message was queued for.
    pub async fn broadcast(&self, message: &str) -> usize {
        self.active_connections.sweep(message).await
    }

    pub async fn len(&self) -> usize {
        self.active_connections.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn close_all(&self) -> usize {
        self.active_connections.clear().await
    }
}

pub async fn chat_socket(
    ws: WebSocketUpgrade,
    State(chat): State<ChatBroadcaster>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let (connection, outbound) = Connection::open();
        let id = connection.id();
        chat.connect(connection).await;

        let chat1 = chat.clone();
        serve_socket(socket, outbound, move |text| {
            let chat = chat1.clone();
            async move {
                chat.broadcast(&text).await;
            }
        })
        .await;

        chat.disconnect(id).await;
    })
}
