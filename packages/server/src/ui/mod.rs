//! WebSocket chat server implementation.

pub mod config;
pub mod error;
mod handler;
mod server;
pub mod session;
mod signal;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use server::Server;
