//! Trait definitions
//!
//! This module defines the storage contract and entity metadata.

pub mod context;
pub mod entity;

pub use context::{DataContext, TableRef};
pub use entity::Entity;
