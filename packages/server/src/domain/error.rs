//! Domain errors.

use thiserror::Error;

use super::UserId;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// Room ID is not a positive integer
    #[error("Invalid room ID format: '{0}'")]
    InvalidRoomId(String),

    /// Message content is empty after trimming
    #[error("Message content must not be empty")]
    EmptyContent,

    /// Message content exceeds the character limit
    #[error("Message content too long: {actual} characters (max {max})")]
    ContentTooLong { actual: usize, max: usize },
}

/// Persistence boundary errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Sender is not known to the user directory
    #[error("User {0} not found")]
    UserNotFound(UserId),

    /// Underlying store rejected the write
    #[error("Storage failure: {0}")]
    Storage(String),
}
