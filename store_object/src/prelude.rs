//! Convenience re-exports for common store-object usage

// Core traits
pub use crate::traits::{DataContext, Entity, TableRef};

// Error types
pub use crate::errors::StoreError;

// Keys
pub use crate::key_value::{HasKeyValue, KeyValue};

// Backends
pub use crate::in_memory::{InMemoryContext, InMemoryDatabase};
pub use crate::pg_context::PgContext;

// Typed table access
pub use crate::entity_set::EntitySet;

// Query building
pub use crate::query_builder::{QueryBuilder, QueryFilter, SortOrder};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use sqlx::PgPool;
pub use uuid::Uuid;
