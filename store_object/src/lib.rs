//! Store Object - storage contract for crudhaus
//!
//! This crate provides the entity metadata trait, the unit-of-work
//! [`DataContext`] contract with its in-memory and PostgreSQL backends, and the
//! staged [`QueryBuilder`] both backends execute.

pub mod entity_set;
pub mod errors;
pub mod identifier;
pub mod in_memory;
pub mod key_value;
pub mod pg_context;
pub mod prelude;
pub mod query_builder;
pub mod traits;

pub use entity_set::EntitySet;
pub use errors::StoreError;
pub use identifier::{IdentifierError, SqlIdentifier};
pub use in_memory::{InMemoryContext, InMemoryDatabase};
pub use key_value::{HasKeyValue, KeyValue};
pub use pg_context::{connect_pool, PgContext};
pub use query_builder::{QueryBuilder, QueryFilter, QueryOperator, QueryStage, SortOrder};
pub use traits::*;

use sqlx::PgPool;

pub type DbPool = PgPool;
