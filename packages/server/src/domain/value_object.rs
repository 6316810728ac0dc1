//! Value objects used by the chat core.
//!
//! Room and user identifiers are owned by the surrounding CRUD services; the
//! core only validates their shape and uses them as keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValueObjectError;

/// Maximum number of characters in a single chat message
pub const MAX_CONTENT_CHARS: usize = 4096;

/// Room identifier (positive integer, partition key for fan-out)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(u64);

impl RoomId {
    /// Create a RoomId, rejecting zero
    pub fn new(value: u64) -> Result<Self, ValueObjectError> {
        if value == 0 {
            return Err(ValueObjectError::InvalidRoomId(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<&str> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let parsed = value
            .parse::<u64>()
            .map_err(|_| ValueObjectError::InvalidRoomId(value.to_string()))?;
        Self::new(parsed).map_err(|_| ValueObjectError::InvalidRoomId(value.to_string()))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Surrogate identifier assigned to a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u64);

impl MessageId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Identity of one live connection.
///
/// Two connections of the same user in the same room are distinct sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat message body (non-empty, at most [`MAX_CONTENT_CHARS`] characters)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyContent);
        }
        let actual = value.chars().count();
        if actual > MAX_CONTENT_CHARS {
            return Err(ValueObjectError::ContentTooLong {
                actual,
                max: MAX_CONTENT_CHARS,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
