//! Server state shared by all handlers.

use std::sync::Arc;

use crate::{
    hub::HubHandle, infrastructure::auth::JwtVerifier, usecase::GetMessageHistoryUseCase,
};

/// Shared application state
pub struct AppState {
    /// Room Registry submission handle
    pub hub: HubHandle,
    /// Bearer token verifier
    pub verifier: JwtVerifier,
    /// Capacity of each new session's outbound queue
    pub outbound_capacity: usize,
    /// Largest inbound WebSocket message accepted by the transport
    pub max_frame_bytes: usize,
    /// GetMessageHistoryUseCase（履歴取得のユースケース）
    pub get_message_history_usecase: Arc<GetMessageHistoryUseCase>,
}
