//! Session tokens and password hashing.

pub mod password;
pub mod tokens;

pub use tokens::{TokenError, TokenService};
