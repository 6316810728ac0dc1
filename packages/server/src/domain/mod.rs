//! Domain layer: value objects, entities, and the persistence boundary.

pub mod entity;
pub mod error;
pub mod repository;
pub mod value_object;

pub use entity::{PostedMessage, StoredMessage, UserProfile};
pub use error::{RepositoryError, ValueObjectError};
pub use repository::MessageRepository;
#[cfg(test)]
pub use repository::MockMessageRepository;
pub use value_object::{MessageContent, MessageId, RoomId, SessionId, UserId};
