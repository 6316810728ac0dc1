//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    domain::MessageRepository, hub, infrastructure::auth::JwtVerifier,
    usecase::GetMessageHistoryUseCase,
};

use super::{
    config::ServerConfig,
    handler::{get_room_messages, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Realtime room chat server
///
/// Owns the configuration and the persistence boundary; the room registry is
/// started when the server starts serving.
///
/// # Example
///
/// ```ignore
/// let repository = Arc::new(InMemoryMessageRepository::new(users));
/// let server = Server::new(ServerConfig::default(), repository);
/// server.run().await?;
/// ```
pub struct Server {
    config: ServerConfig,
    repository: Arc<dyn MessageRepository>,
}

impl Server {
    pub fn new(config: ServerConfig, repository: Arc<dyn MessageRepository>) -> Self {
        Self { config, repository }
    }

    /// Bind to the configured address and serve until Ctrl+C / SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured address or
    /// if there's an error during server execution.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = self.config.bind_addr();
        let listener = TcpListener::bind(&bind_addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`super::config::ConfigError`] without spawning anything if the
    /// configuration is invalid.
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.config.validate()?;

        let (hub, hub_task) = hub::spawn(self.repository.clone(), self.config.intake_capacity);

        let app_state = Arc::new(AppState {
            hub,
            verifier: JwtVerifier::new(&self.config.jwt_secret),
            outbound_capacity: self.config.outbound_capacity,
            max_frame_bytes: self.config.max_frame_bytes,
            get_message_history_usecase: Arc::new(GetMessageHistoryUseCase::new(
                self.repository,
            )),
        });

        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws/rooms/{room_id}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms/{room_id}/messages", get(get_room_messages))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        let local_addr = listener.local_addr()?;
        tracing::info!("Chat server listening on {}", local_addr);
        tracing::info!("Connect to: ws://{}/ws/rooms/{{room_id}}?token=...", local_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        // Sessions still attached hold hub handles; stop the registry explicitly.
        hub_task.abort();
        served?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
