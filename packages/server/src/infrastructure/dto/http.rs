//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::MessageDto;

/// Error body returned by rejected requests and handshakes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    pub error: String,
}

/// Room history response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageHistoryDto {
    pub room_id: u64,
    pub messages: Vec<MessageDto>,
}
