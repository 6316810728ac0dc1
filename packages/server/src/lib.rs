//! Realtime room chat server library.
//!
//! Clients join a numbered room over WebSocket, send text messages, and receive
//! every message posted to that room (their own included) as JSON frames. A
//! single room registry task owns all room membership; each connection runs as
//! a reader/writer pair feeding it.

// layers
pub mod domain;
pub mod hub;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
