//! In-memory repository implementations.

pub mod message;

pub use message::InMemoryMessageRepository;
