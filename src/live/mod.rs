//! Live socket channels: the `/ws/notify` relay and the `/ws/chat`
//! broadcaster. Both keep a list of the sockets currently open and fan every
//! inbound message out to all of them.

use std::{future::Future, sync::Arc};

use axum::extract::ws::{Message, WebSocket};
use futures::{sink::SinkExt, stream::StreamExt};
use indexmap::IndexMap;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

pub mod chat;
pub mod relay;

pub type ConnectionId = Uuid;

/// The sending half of one client's socket. Text pushed here is written to
/// the socket by the task serving it.
#[derive(Clone, Debug)]
pub struct Connection {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<String>,
}

impl Connection {
    /// Creates a handle together with the queue the socket task drains.
    pub fn open() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                id: Uuid::new_v4(),
                tx,
            },
            rx,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues `text` for the client. Fails only once the socket task has
    /// gone away.
    fn send(&self, text: String) -> bool {
        self.tx.send(text).is_ok()
    }
}

/// Open connections, kept in the order they were registered.
#[derive(Clone, Default)]
pub(crate) struct ConnectionList {
    inner: Arc<RwLock<IndexMap<ConnectionId, Connection>>>,
}

impl ConnectionList {
    pub(crate) async fn push(&self, connection: Connection) {
        let mut w = self.inner.write().await;
        w.insert(connection.id, connection);
    }

    pub(crate) async fn remove(&self, id: ConnectionId) -> bool {
        let mut w = self.inner.write().await;
        w.shift_remove(&id).is_some()
    }

    pub(crate) async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Forgets every connection. Dropping the handles closes the queues,
    /// which in turn closes the sockets.
    pub(crate) async fn clear(&self) -> usize {
        let mut w = self.inner.write().await;
        let n = w.len();
        w.clear();
        n
    }

    async fn snapshot(&self) -> Vec<Connection> {
        self.inner.read().await.values().cloned().collect()
    }

    /// Sends `text` to everything registered when the sweep starts, in
    /// registration order. Connections whose socket has already gone are
    /// skipped; they are removed when their disconnect is processed.
    /// Returns how many connections the text was queued for.
    pub(crate) async fn sweep(&self, text: &str) -> usize {
        let snapshot = self.snapshot().await;

        let mut delivered = 0;
        for connection in &snapshot {
            if connection.send(text.to_string()) {
                delivered += 1;
            } else {
                tracing::debug!(
                    connection = %connection.id,
                    "skipping connection whose socket has closed"
                );
            }
        }

        tracing::trace!(delivered, of = snapshot.len(), "finished sweep");

        delivered
    }
}

/// Serves one socket until either side is done with it: text queued on
/// `outbound` is written out, and every inbound text frame is handed to
/// `on_text`. Returns once the client disconnects or the queue is closed.
pub(crate) async fn serve_socket<F, Fut>(
    socket: WebSocket,
    mut outbound: mpsc::UnboundedReceiver<String>,
    mut on_text: F,
) where
    F: FnMut(String) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if sender.send(Message::Text(text)).await.is_err() {
                return;
            }
        }
        let _ = sender.close().await;
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => on_text(text).await,
                Ok(Message::Close(_)) => break,
                // pings are answered by axum itself
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("socket read failed: {e}");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };
}
