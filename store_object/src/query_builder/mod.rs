//! Query builder utilities
//!
//! Staged query construction, in-memory evaluation and SQL generation.

pub mod builder;
pub mod evaluation;
pub mod filter;
pub mod ordering;
pub mod sql_generation;

#[cfg(test)]
mod tests;

pub use builder::{QueryBuilder, QueryStage};
pub use filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
pub use ordering::{OrderKey, SortOrder};
pub use sql_generation::SqlGenerator;
