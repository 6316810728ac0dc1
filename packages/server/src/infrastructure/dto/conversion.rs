//! Conversion logic between domain entities and DTOs.

use crate::domain::{PostedMessage, UserProfile};
use crate::infrastructure::dto::websocket as dto;
use rendezvous_shared::time::to_rfc3339_millis;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&UserProfile> for dto::SenderDto {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.value(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

impl From<&PostedMessage> for dto::MessageDto {
    fn from(posted: &PostedMessage) -> Self {
        Self {
            id: posted.message.id.value(),
            content: posted.message.content.as_str().to_string(),
            timestamp: to_rfc3339_millis(&posted.message.created_at),
            sender: dto::SenderDto::from(&posted.sender),
        }
    }
}
