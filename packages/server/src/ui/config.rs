//! Server configuration.

use thiserror::Error;

use crate::hub::{DEFAULT_INTAKE_CAPACITY, DEFAULT_OUTBOUND_CAPACITY};

/// Default maximum size of a single inbound WebSocket message (bytes)
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024;

/// Runtime settings for [`super::Server`]
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g., "127.0.0.1")
    pub host: String,
    /// The port number to bind to (e.g., 8082)
    pub port: u16,
    /// HS256 secret used to verify bearer tokens
    pub jwt_secret: String,
    /// Capacity of each session's outbound queue
    pub outbound_capacity: usize,
    /// Capacity of the room registry's intake queue
    pub intake_capacity: usize,
    /// Largest inbound WebSocket message accepted by the transport
    pub max_frame_bytes: usize,
}

/// Settings that cannot be served with
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be at least 1")]
    ZeroCapacity(&'static str),
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject zero-sized queues and frame limits before anything is spawned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.outbound_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("outbound_capacity"));
        }
        if self.intake_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("intake_capacity"));
        }
        if self.max_frame_bytes == 0 {
            return Err(ConfigError::ZeroCapacity("max_frame_bytes"));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8082,
            jwt_secret: "your-secret-key".to_string(),
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            intake_capacity: DEFAULT_INTAKE_CAPACITY,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}
