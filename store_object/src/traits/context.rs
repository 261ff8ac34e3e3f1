//! Storage contract
//!
//! A [`DataContext`] is one unit of work. Reads see the context's own staged
//! writes; nothing is visible to other contexts until `apply_changes`.

use crate::errors::StoreError;
use crate::key_value::KeyValue;
use crate::query_builder::QueryBuilder;
use async_trait::async_trait;
use serde_json::Value;

/// Table name plus primary key column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub name: &'static str,
    pub primary_key: &'static str,
}

impl TableRef {
    pub const fn new(name: &'static str, primary_key: &'static str) -> Self {
        Self { name, primary_key }
    }
}

#[async_trait]
pub trait DataContext: Send + Sync {
    /// Rows returned by `query`, projected when the query selects fields
    async fn fetch(&self, table: &TableRef, query: &QueryBuilder) -> Result<Vec<Value>, StoreError>;

    /// Number of rows `query` returns
    async fn count(&self, table: &TableRef, query: &QueryBuilder) -> Result<u64, StoreError>;

    /// Stage an insert and return the stored row
    async fn insert(&self, table: &TableRef, row: Value) -> Result<Value, StoreError>;

    /// Stage a full-row update keyed by the row's primary key
    async fn update(&self, table: &TableRef, row: Value) -> Result<Value, StoreError>;

    /// Stage a delete; false when no row had that key
    async fn delete(&self, table: &TableRef, key: &KeyValue) -> Result<bool, StoreError>;

    /// Commit staged writes, returning the number of affected rows
    async fn apply_changes(&self) -> Result<u64, StoreError>;

    /// Drop staged writes
    async fn discard_changes(&self) -> Result<(), StoreError>;
}
