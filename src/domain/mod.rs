//! Domain layer - Pure business types and rules.

pub mod models;
pub mod pagination;
pub mod sort;
pub mod validation;
pub mod views;
