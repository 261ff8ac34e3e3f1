//! Staged query construction
//!
//! A [`QueryBuilder`] records operations in the order they were applied, the way
//! a chain of `where`/`order by`/`skip`/`take` calls would. Ordering matters:
//! `take(10).filter(..)` filters the first ten rows while `filter(..).take(10)`
//! takes ten matching rows.

use crate::query_builder::filter::QueryFilter;
use crate::query_builder::ordering::{OrderKey, SortOrder};
use crate::query_builder::sql_generation::SqlGenerator;
use serde_json::Value;

/// One recorded query operation
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStage {
    Filter(QueryFilter),
    /// Replaces any ordering applied so far
    OrderBy(OrderKey),
    /// Refines the current ordering
    ThenBy(OrderKey),
    Skip(u64),
    Take(u64),
}

/// Query builder for constructing staged queries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    pub(crate) stages: Vec<QueryStage>,
    pub(crate) select: Option<Vec<String>>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter condition
    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.stages.push(QueryStage::Filter(filter));
        self
    }

    /// Add multiple filters (combined with AND)
    pub fn filters(mut self, filters: Vec<QueryFilter>) -> Self {
        self.stages
            .extend(filters.into_iter().map(QueryStage::Filter));
        self
    }

    /// Order by `field`, discarding earlier ordering
    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.stages
            .push(QueryStage::OrderBy(OrderKey::new(field, order)));
        self
    }

    /// Secondary ordering; behaves like `order_by` on an unordered query
    pub fn then_by(mut self, field: &str, order: SortOrder) -> Self {
        let stage = if self.is_ordered() {
            QueryStage::ThenBy(OrderKey::new(field, order))
        } else {
            QueryStage::OrderBy(OrderKey::new(field, order))
        };
        self.stages.push(stage);
        self
    }

    pub fn skip(mut self, count: u64) -> Self {
        self.stages.push(QueryStage::Skip(count));
        self
    }

    pub fn take(mut self, count: u64) -> Self {
        self.stages.push(QueryStage::Take(count));
        self
    }

    /// Restrict returned rows to these fields
    pub fn select(mut self, fields: Vec<String>) -> Self {
        self.select = Some(fields);
        self
    }

    pub fn stages(&self) -> &[QueryStage] {
        &self.stages
    }

    pub fn selected_fields(&self) -> Option<&[String]> {
        self.select.as_deref()
    }

    pub fn is_ordered(&self) -> bool {
        self.stages
            .iter()
            .any(|stage| matches!(stage, QueryStage::OrderBy(_)))
    }

    /// Every field name referenced by filters, ordering and projection
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        for stage in &self.stages {
            match stage {
                QueryStage::Filter(filter) => fields.extend(filter.fields()),
                QueryStage::OrderBy(key) | QueryStage::ThenBy(key) => fields.push(&key.field),
                QueryStage::Skip(_) | QueryStage::Take(_) => {}
            }
        }
        if let Some(select) = &self.select {
            fields.extend(select.iter().map(String::as_str));
        }
        fields
    }

    /// Build a complete `SELECT` against `table` together with its parameters
    pub fn build_select(&self, table: &str) -> (String, Vec<Value>) {
        SqlGenerator::build_select(table, self)
    }

    /// Build a `SELECT COUNT(*)` against `table` together with its parameters
    pub fn build_count(&self, table: &str) -> (String, Vec<Value>) {
        SqlGenerator::build_count(table, self)
    }
}
