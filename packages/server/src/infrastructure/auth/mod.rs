//! Bearer credential verification.

pub mod jwt;

pub use jwt::{AuthError, Claims, JwtVerifier, bearer_token};
