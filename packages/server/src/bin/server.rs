//! Realtime room chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin rendezvous-server -- --users config/users.example.json
//! JWT_SECRET=change-me PORT=3000 cargo run --bin rendezvous-server
//! ```

use std::{path::Path, sync::Arc};

use clap::{Parser, builder::RangedU64ValueParser};
use rendezvous_server::{
    domain::UserProfile,
    hub::{DEFAULT_INTAKE_CAPACITY, DEFAULT_OUTBOUND_CAPACITY},
    infrastructure::repository::InMemoryMessageRepository,
    ui::{Server, ServerConfig, config::DEFAULT_MAX_FRAME_BYTES},
};
use rendezvous_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "rendezvous-server")]
#[command(about = "Realtime room chat server over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value_t = 8082)]
    port: u16,

    /// HS256 secret used to verify bearer tokens
    #[arg(long, env = "JWT_SECRET", default_value = "your-secret-key", hide_env_values = true)]
    jwt_secret: String,

    /// Capacity of each session's outbound queue
    #[arg(
        long,
        env = "OUTBOUND_CAPACITY",
        default_value_t = DEFAULT_OUTBOUND_CAPACITY,
        value_parser = positive_usize()
    )]
    outbound_capacity: usize,

    /// Capacity of the room registry's intake queue
    #[arg(
        long,
        env = "INTAKE_CAPACITY",
        default_value_t = DEFAULT_INTAKE_CAPACITY,
        value_parser = positive_usize()
    )]
    intake_capacity: usize,

    /// Largest inbound WebSocket message in bytes
    #[arg(
        long,
        env = "MAX_FRAME_BYTES",
        default_value_t = DEFAULT_MAX_FRAME_BYTES,
        value_parser = positive_usize()
    )]
    max_frame_bytes: usize,

    /// JSON file with the known user profiles
    #[arg(long, env = "USERS_FILE")]
    users: Option<String>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "debug")]
    log_level: String,
}

fn positive_usize() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::<usize>::new().range(1..)
}

fn load_users(path: &Path) -> Result<Vec<UserProfile>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let users = serde_json::from_str(&raw)?;
    Ok(users)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // 1. Load known users
    let users = match args.users.as_deref() {
        Some(path) => match load_users(Path::new(path)) {
            Ok(users) => users,
            Err(e) => {
                tracing::error!("Failed to load users from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::warn!("No user directory given; every broadcast will be rejected");
            Vec::new()
        }
    };

    // 2. Create Repository (in-memory database)
    let repository = Arc::new(InMemoryMessageRepository::new(users));
    tracing::info!("Loaded {} user profiles", repository.user_count());

    // 3. Create and run the server
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        jwt_secret: args.jwt_secret,
        outbound_capacity: args.outbound_capacity,
        intake_capacity: args.intake_capacity,
        max_frame_bytes: args.max_frame_bytes,
    };
    let server = Server::new(config, repository);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
