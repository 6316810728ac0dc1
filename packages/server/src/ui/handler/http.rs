//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, header::AUTHORIZATION},
};

use crate::{
    domain::RoomId,
    infrastructure::{
        auth::bearer_token,
        dto::{http::MessageHistoryDto, websocket::MessageDto},
    },
    ui::{error::ApiError, state::AppState},
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get a room's message history (oldest first)
pub async fn get_room_messages(
    State(state): State<Arc<AppState>>,
    Path(raw_room_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<MessageHistoryDto>, ApiError> {
    let room_id = RoomId::try_from(raw_room_id.as_str()).map_err(ApiError::InvalidRoomId)?;

    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let user_id = state.verifier.verify(bearer_token(header)?)?;

    let messages = state
        .get_message_history_usecase
        .execute(room_id)
        .await
        .inspect_err(|e| tracing::error!("Failed to load history of room {}: {}", room_id, e))?;

    tracing::debug!(
        "User {} read {} messages from room {}",
        user_id,
        messages.len(),
        room_id
    );

    // Domain Model から DTO への変換
    let history = MessageHistoryDto {
        room_id: room_id.value(),
        messages: messages.iter().map(MessageDto::from).collect(),
    };
    Ok(Json(history))
}
