//! Adapters - Concrete implementations of ports.

pub mod cloudinary;
pub mod http;
pub mod local;
pub mod memory;
pub mod mongo;
