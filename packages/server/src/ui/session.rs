//! Client Session: one live, authenticated, room-bound connection.
//!
//! Each session runs a reader loop (inbound frames → registry intake) and a
//! writer loop (outbound queue → socket) as separate tasks. Whichever loop
//! ends first aborts the other. The loops never unsubscribe themselves: the
//! supervising task fires [`Teardown`] once both are stopped, so aborting a
//! loop can never cancel an unsubscribe in flight.

use std::fmt::Display;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};

use crate::{
    domain::{MessageContent, RoomId, SessionId, UserId},
    hub::{Frame, HubHandle, Subscriber},
    infrastructure::dto::websocket::decode_inbound,
};

/// Single-shot close guard for a session
pub struct Teardown {
    /// Set only after the unsubscribe has been handed to the intake queue.
    fired: Mutex<bool>,
    hub: HubHandle,
    room_id: RoomId,
    session_id: SessionId,
}

impl Teardown {
    pub fn new(hub: HubHandle, room_id: RoomId, session_id: SessionId) -> Self {
        Self {
            fired: Mutex::new(false),
            hub,
            room_id,
            session_id,
        }
    }

    /// Submit the session for unsubscription. Only the first completed call does anything.
    ///
    /// Returns `true` if this call performed the teardown. If a call is
    /// cancelled while waiting on a full intake queue, the guard stays unset
    /// and the next call submits again.
    pub async fn fire(&self) -> bool {
        let mut fired = self.fired.lock().await;
        if *fired {
            return false;
        }
        if let Err(e) = self.hub.unsubscribe(self.room_id, self.session_id).await {
            tracing::warn!("Failed to unsubscribe session {}: {}", self.session_id, e);
        }
        *fired = true;
        true
    }

    #[cfg(test)]
    async fn has_fired(&self) -> bool {
        *self.fired.lock().await
    }
}

/// A session created by a successful handshake
pub struct ClientSession {
    id: SessionId,
    room_id: RoomId,
    user_id: UserId,
    hub: HubHandle,
}

impl ClientSession {
    pub fn new(room_id: RoomId, user_id: UserId, hub: HubHandle) -> Self {
        Self {
            id: SessionId::generate(),
            room_id,
            user_id,
            hub,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Subscribe to the registry, then drive the connection until either loop ends.
    pub async fn run(self, socket: WebSocket, outbound_capacity: usize) {
        let (outbound_tx, outbound_rx) = mpsc::channel(outbound_capacity);
        let subscriber = Subscriber {
            session_id: self.id,
            room_id: self.room_id,
            user_id: self.user_id,
            outbound: outbound_tx,
        };
        if let Err(e) = self.hub.subscribe(subscriber).await {
            tracing::error!("Failed to subscribe session {}: {}", self.id, e);
            return;
        }

        tracing::info!(
            "Session {} started for user {} in room {}",
            self.id,
            self.user_id,
            self.room_id
        );

        let (sink, stream) = socket.split();
        let teardown = Teardown::new(self.hub.clone(), self.room_id, self.id);

        let recv_task = tokio::spawn(reader_loop(
            stream,
            self.hub.clone(),
            self.room_id,
            self.user_id,
        ));
        let send_task = tokio::spawn(writer_loop(outbound_rx, sink));

        supervise(recv_task, send_task, &teardown).await;
        tracing::info!("Session {} for user {} closed", self.id, self.user_id);
    }
}

/// Wait for either loop to finish, abort the other, then fire teardown.
pub async fn supervise(
    mut recv_task: JoinHandle<()>,
    mut send_task: JoinHandle<()>,
    teardown: &Teardown,
) {
    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    teardown.fire().await;
}

/// Decode inbound frames and forward chat content to the registry.
///
/// Returns on close, transport error, or a malformed frame.
pub async fn reader_loop<S>(mut stream: S, hub: HubHandle, room_id: RoomId, user_id: UserId)
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(msg) = stream.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!("WebSocket error from user {}: {}", user_id, e);
                break;
            }
        };

        let frame = match &msg {
            Message::Text(text) => decode_inbound(text.as_str().as_bytes()),
            Message::Binary(data) => decode_inbound(data),
            Message::Close(_) => {
                tracing::info!("User {} requested close", user_id);
                break;
            }
            // Ping/pong is handled automatically by the WebSocket protocol
            _ => continue,
        };

        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Closing session of user {}: {}", user_id, e);
                break;
            }
        };

        let content = match MessageContent::new(frame.content) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Ignoring message from user {}: {}", user_id, e);
                continue;
            }
        };

        if let Err(e) = hub.broadcast(room_id, user_id, content).await {
            tracing::error!("Cannot forward message from user {}: {}", user_id, e);
            break;
        }
    }
}

/// Write queued frames to the socket until the registry closes the queue.
pub async fn writer_loop<S>(mut outbound: mpsc::Receiver<Frame>, mut sink: S)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = sink.send(Message::Text(frame)).await {
            tracing::warn!("Failed to write frame: {}", e);
            return;
        }
    }

    // Queue closed by the registry: no more frames will arrive.
    let _ = sink.send(Message::Close(None)).await;
}
