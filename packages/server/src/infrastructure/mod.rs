//! Infrastructure layer: concrete persistence, token verification, and wire DTOs.

pub mod auth;
pub mod dto;
pub mod repository;
