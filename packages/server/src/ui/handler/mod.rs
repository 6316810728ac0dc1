//! Route handlers.

mod http;
mod websocket;

pub use http::{get_room_messages, health_check};
pub use websocket::websocket_handler;
