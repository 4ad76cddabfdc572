//! Vidtube - video sharing backend
//!
//! Hexagonal Architecture:
//! - domain/: Records, API views and validation rules
//! - ports/: Repository and media storage traits
//! - adapters/: MongoDB, in-memory, local disk, Cloudinary and HTTP implementations
//! - application/: One service per resource
//! - auth: Session tokens and password hashing
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

pub use adapters::http::{router, AppState};
pub use application::Services;
pub use config::AppConfig;
