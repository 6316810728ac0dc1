//! WebSocket frame DTOs and the wire codec.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PostedMessage;

/// Client → server frame. Room and sender come from the session, never from here.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundChatFrame {
    pub content: String,
}

/// Public identity of a message sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderDto {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: String,
}

/// Server → client chat frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: u64,
    pub content: String,
    /// RFC 3339, millisecond precision, UTC
    pub timestamp: String,
    pub sender: SenderDto,
}

/// Inbound frame decode failure
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed chat frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode an inbound text or binary payload into a chat frame.
pub fn decode_inbound(payload: &[u8]) -> Result<InboundChatFrame, DecodeError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Serialize a stored message into its outbound wire form.
pub fn encode_message(posted: &PostedMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(&MessageDto::from(posted))
}
