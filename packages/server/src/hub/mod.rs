//! Room Registry: the single coordinating task that owns room membership.
//!
//! All subscribe, unsubscribe and broadcast requests travel through one
//! ordered intake queue and are applied one at a time by [`runner::run`],
//! so the membership map needs no lock.
//!
//! ```text
//! reader loop ──┐
//! gateway ──────┼──► intake queue ──► RoomRegistry ──► MessageRepository
//! teardown ─────┘                         │
//!                                         └──► outbound queue (per session) ──► writer loop
//! ```

mod handle;
mod registry;
mod runner;

pub use handle::{HubError, HubHandle};
pub use registry::{BroadcastError, BroadcastReport, RoomRegistry};
pub use runner::spawn;

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc;

use crate::domain::{MessageContent, RoomId, SessionId, UserId};

/// A serialized outbound frame. Cloning shares the underlying bytes.
pub type Frame = Utf8Bytes;

/// Default capacity of each session's outbound queue
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Default capacity of the registry's intake queue
pub const DEFAULT_INTAKE_CAPACITY: usize = 1024;

/// The registry's view of a client session
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub session_id: SessionId,
    pub room_id: RoomId,
    pub user_id: UserId,
    /// Producer side of the session's outbound queue. The registry holds the
    /// only sender, so dropping it closes the queue.
    pub outbound: mpsc::Sender<Frame>,
}

/// Events accepted by the registry's intake queue
#[derive(Debug)]
pub enum HubCommand {
    Subscribe(Subscriber),
    Unsubscribe {
        room_id: RoomId,
        session_id: SessionId,
    },
    Broadcast {
        room_id: RoomId,
        sender_id: UserId,
        content: MessageContent,
    },
}
