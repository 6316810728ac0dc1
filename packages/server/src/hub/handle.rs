//! Cloneable submission handle for the Room Registry.

use thiserror::Error;
use tokio::sync::mpsc;

use super::{HubCommand, Subscriber};
use crate::domain::{MessageContent, RoomId, SessionId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// The coordinating task has exited
    #[error("Room registry is no longer running")]
    Closed,
}

/// Handle passed to gateways and sessions to submit registry events.
///
/// Submissions wait while the intake queue is full.
#[derive(Debug, Clone)]
pub struct HubHandle {
    intake: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    pub(crate) fn new(intake: mpsc::Sender<HubCommand>) -> Self {
        Self { intake }
    }

    pub async fn subscribe(&self, subscriber: Subscriber) -> Result<(), HubError> {
        self.submit(HubCommand::Subscribe(subscriber)).await
    }

    pub async fn unsubscribe(&self, room_id: RoomId, session_id: SessionId) -> Result<(), HubError> {
        self.submit(HubCommand::Unsubscribe {
            room_id,
            session_id,
        })
        .await
    }

    pub async fn broadcast(
        &self,
        room_id: RoomId,
        sender_id: UserId,
        content: MessageContent,
    ) -> Result<(), HubError> {
        self.submit(HubCommand::Broadcast {
            room_id,
            sender_id,
            content,
        })
        .await
    }

    async fn submit(&self, command: HubCommand) -> Result<(), HubError> {
        self.intake.send(command).await.map_err(|_| HubError::Closed)
    }
}
