//! Utilities shared between the Rendezvous server crates.

pub mod logger;
pub mod time;
