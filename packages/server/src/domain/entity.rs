//! Domain entities.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{MessageContent, MessageId, RoomId, UserId};

/// User profile as known to the persistence side.
///
/// `email` is private: it is loaded from the user directory but never leaves
/// the server through the wire codec.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub email: String,
}

/// A chat message after it has been stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub content: MessageContent,
    pub created_at: DateTime<Utc>,
}

/// A stored message together with its sender's profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub message: StoredMessage,
    pub sender: UserProfile,
}
