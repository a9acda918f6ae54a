//! WebSocket subscriber connections
//!
//! Each upgraded socket is split. The write half becomes the subscriber's
//! [`EventSink`] and is handed to the broadcaster; the read half stays here
//! and is drained until the peer goes away. Subscribers never send
//! anything meaningful, so inbound messages are discarded.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::future::BoxFuture;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::{oneshot, OwnedSemaphorePermit, Semaphore};

use crate::registry::{CommandSender, EventSink, IdAllocator, RegistryCommand, RegistryError};
use crate::shutdown::StopSignal;

/// Shared state for connection handlers
#[derive(Clone)]
pub(crate) struct ConnectionState {
    commands: CommandSender,
    ids: Arc<IdAllocator>,
    permits: Option<Arc<Semaphore>>,
    stop: StopSignal,
}

impl ConnectionState {
    pub(crate) fn new(commands: CommandSender, max_connections: usize, stop: StopSignal) -> Self {
        let permits = if max_connections > 0 {
            Some(Arc::new(Semaphore::new(max_connections)))
        } else {
            None
        };

        Self {
            commands,
            ids: Arc::new(IdAllocator::new()),
            permits,
            stop,
        }
    }
}

/// Routes served to subscribers
pub(crate) fn router(state: ConnectionState) -> Router {
    Router::new().route("/", get(ws_handler)).with_state(state)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<ConnectionState>,
) -> Response {
    // Check connection limit
    let permit = match state.permits {
        Some(ref sem) => match Arc::clone(sem).try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                tracing::warn!(peer = %peer, "Connection rejected: limit reached");
                return StatusCode::SERVICE_UNAVAILABLE.into_response();
            }
        },
        None => None,
    };

    ws.on_upgrade(move |socket| handle_socket(socket, peer, state, permit))
}

async fn handle_socket(
    socket: WebSocket,
    peer: SocketAddr,
    mut state: ConnectionState,
    _permit: Option<OwnedSemaphorePermit>,
) {
    let id = state.ids.next_id();
    let (sender, mut receiver) = socket.split();
    let (closed_tx, mut closed_rx) = oneshot::channel();

    let sink = WsSink {
        sender,
        _closed: closed_tx,
    };
    if state
        .commands
        .send(RegistryCommand::Connect(id, Box::new(sink)))
        .is_err()
    {
        // broadcaster already gone
        return;
    }

    tracing::debug!(subscriber = %id, peer = %peer, "WebSocket upgraded");

    loop {
        tokio::select! {
            message = receiver.next() => match message {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!(subscriber = %id, error = %e, "WebSocket read error");
                    break;
                }
                Some(Ok(_)) => {}
            },
            // registry dropped the sink after a failed send
            _ = &mut closed_rx => break,
            _ = state.stop.stopped() => break,
        }
    }

    let _ = state.commands.send(RegistryCommand::Disconnect(id));
    tracing::debug!(subscriber = %id, peer = %peer, "WebSocket closed");
}

/// Write half of a subscriber socket
struct WsSink {
    sender: SplitSink<WebSocket, Message>,
    /// Dropped with the sink, which ends the connection's read loop
    _closed: oneshot::Sender<()>,
}

impl EventSink for WsSink {
    fn send<'a>(&'a mut self, payload: &'a str) -> BoxFuture<'a, Result<(), RegistryError>> {
        Box::pin(async move {
            self.sender
                .send(Message::Text(payload.to_owned().into()))
                .await
                .map_err(|e| RegistryError::Transport(e.to_string()))
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let _ = self.sender.close().await;
        })
    }
}
