//! Ports - Trait definitions implemented by the adapters.

pub mod media;
pub mod repository;
