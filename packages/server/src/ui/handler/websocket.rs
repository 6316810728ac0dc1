//! Connection Gateway: validates the handshake and starts a Client Session.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    domain::{RoomId, UserId},
    infrastructure::auth::{AuthError, JwtVerifier},
    ui::{error::ApiError, session::ClientSession, state::AppState},
};

/// Query parameters for WebSocket connection.
///
/// Browsers cannot set headers on the upgrade request, so the bearer
/// credential travels in the query string.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

/// Validate room ID and credential; no session exists until both pass.
pub fn authorize_handshake(
    verifier: &JwtVerifier,
    raw_room_id: &str,
    token: Option<&str>,
) -> Result<(RoomId, UserId), ApiError> {
    let room_id = RoomId::try_from(raw_room_id).map_err(ApiError::InvalidRoomId)?;
    let token = token.ok_or(AuthError::MissingToken)?;
    let user_id = verifier.verify(token)?;
    Ok((room_id, user_id))
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(raw_room_id): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> Response {
    let (room_id, user_id) =
        match authorize_handshake(&state.verifier, &raw_room_id, query.token.as_deref()) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!("Rejecting WebSocket handshake for room '{}': {}", raw_room_id, e);
                return e.into_response();
            }
        };

    let session = ClientSession::new(room_id, user_id, state.hub.clone());
    tracing::info!(
        "User {} connecting to room {} as session {}",
        user_id,
        room_id,
        session.id()
    );

    let outbound_capacity = state.outbound_capacity;
    ws.max_message_size(state.max_frame_bytes)
        .on_upgrade(move |socket| session.run(socket, outbound_capacity))
}
