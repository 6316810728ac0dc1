//! The coordinating task that drives the Room Registry.

use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};

use super::{HubCommand, HubHandle, RoomRegistry};
use crate::domain::MessageRepository;

/// Spawn the registry task and return its submission handle.
///
/// The task runs until every [`HubHandle`] clone has been dropped.
pub fn spawn(
    repository: Arc<dyn MessageRepository>,
    intake_capacity: usize,
) -> (HubHandle, JoinHandle<()>) {
    let (intake_tx, intake_rx) = mpsc::channel(intake_capacity);
    let registry = RoomRegistry::new(repository);
    let task = tokio::spawn(run(registry, intake_rx));
    (HubHandle::new(intake_tx), task)
}

/// Apply intake events one at a time, in arrival order.
pub async fn run(mut registry: RoomRegistry, mut intake: mpsc::Receiver<HubCommand>) {
    tracing::info!("Room registry started");
    while let Some(command) = intake.recv().await {
        registry.handle(command).await;
    }
    tracing::info!(
        "Room registry stopped ({} rooms still had sessions)",
        registry.room_count()
    );
}
