//! PostgreSQL text generation for staged queries
//!
//! Stages are folded into segments. A segment is one `SELECT` level with its own
//! `WHERE`, `ORDER BY`, `LIMIT` and `OFFSET`; whenever a stage cannot be expressed
//! on the current level (a filter after a limit, a skip after a take) the level
//! is closed and wrapped as a subquery of the next one. Parameters are numbered
//! across all levels.

use crate::query_builder::builder::{QueryBuilder, QueryStage};
use crate::query_builder::filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::ordering::OrderKey;
use serde_json::Value;

pub struct SqlGenerator;

#[derive(Debug, Default, Clone)]
struct Segment {
    conditions: Vec<QueryFilter>,
    order_by: Vec<OrderKey>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Segment {
    fn is_windowed(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }

    /// Close this level; the next one keeps the ordering rows arrived in
    fn close(&mut self, closed: &mut Vec<Segment>) {
        let order_by = self.order_by.clone();
        closed.push(std::mem::take(self));
        self.order_by = order_by;
    }
}

impl SqlGenerator {
    fn segments(query: &QueryBuilder) -> Vec<Segment> {
        let mut closed = Vec::new();
        let mut current = Segment::default();

        for stage in &query.stages {
            match stage {
                QueryStage::Filter(filter) => {
                    if current.is_windowed() {
                        current.close(&mut closed);
                    }
                    current.conditions.push(filter.clone());
                }
                QueryStage::OrderBy(key) => {
                    if current.is_windowed() {
                        current.close(&mut closed);
                    }
                    current.order_by = vec![key.clone()];
                }
                QueryStage::ThenBy(key) => {
                    if current.is_windowed() {
                        current.close(&mut closed);
                    }
                    current.order_by.push(key.clone());
                }
                QueryStage::Skip(count) => {
                    if current.limit.is_some() {
                        current.close(&mut closed);
                    }
                    current.offset = Some(current.offset.unwrap_or(0).saturating_add(*count));
                }
                QueryStage::Take(count) => {
                    current.limit = Some(current.limit.map_or(*count, |limit| limit.min(*count)));
                }
            }
        }

        closed.push(current);
        closed
    }

    fn build_staged(table: &str, query: &QueryBuilder, columns: &str) -> (String, Vec<Value>) {
        let segments = Self::segments(query);
        let last = segments.len() - 1;
        let mut values = Vec::new();
        let mut param_counter = 1;
        let mut sql = String::new();

        for (index, segment) in segments.iter().enumerate() {
            let source = if index == 0 {
                table.to_string()
            } else {
                format!("({}) AS s{}", sql, index)
            };
            let select_list = if index == last { columns } else { "*" };

            let mut level = format!("SELECT {} FROM {}", select_list, source);
            let where_clause =
                Self::where_clause_from(&segment.conditions, &mut values, &mut param_counter);
            for clause in [
                where_clause,
                Self::build_order_clause(&segment.order_by),
                Self::build_limit_clause(segment.limit, segment.offset),
            ] {
                if !clause.is_empty() {
                    level.push(' ');
                    level.push_str(&clause);
                }
            }
            sql = level;
        }

        (sql, values)
    }

    /// Full `SELECT` for a staged query, projected to the selected fields
    pub fn build_select(table: &str, query: &QueryBuilder) -> (String, Vec<Value>) {
        let columns = match query.selected_fields() {
            Some(fields) if !fields.is_empty() => fields.join(", "),
            _ => "*".to_string(),
        };
        Self::build_staged(table, query, &columns)
    }

    /// `SELECT COUNT(*) AS total` over the rows a staged query returns
    pub fn build_count(table: &str, query: &QueryBuilder) -> (String, Vec<Value>) {
        let (inner, values) = Self::build_staged(table, query, "*");
        (
            format!("SELECT COUNT(*) AS total FROM ({}) AS c", inner),
            values,
        )
    }

    /// Build WHERE clause from conditions
    pub fn build_where_clause(conditions: &[QueryFilter]) -> (String, Vec<Value>) {
        let mut values = Vec::new();
        let mut param_counter = 1;
        let clause = Self::where_clause_from(conditions, &mut values, &mut param_counter);
        (clause, values)
    }

    fn where_clause_from(
        conditions: &[QueryFilter],
        values: &mut Vec<Value>,
        param_counter: &mut i32,
    ) -> String {
        if conditions.is_empty() {
            return String::new();
        }

        let conditions_sql = conditions
            .iter()
            .map(|condition| Self::build_condition_sql(condition, values, param_counter))
            .collect::<Vec<_>>()
            .join(" AND ");

        format!("WHERE {}", conditions_sql)
    }

    fn build_condition_sql(
        filter: &QueryFilter,
        values: &mut Vec<Value>,
        param_counter: &mut i32,
    ) -> String {
        match filter {
            QueryFilter::Condition(condition) => {
                Self::build_single_condition_sql(condition, values, param_counter)
            }
            QueryFilter::Group { operator, filters } if filters.is_empty() => match operator {
                LogicalOperator::And => "1=1".to_string(),
                LogicalOperator::Or => "1=0".to_string(),
            },
            QueryFilter::Group { operator, filters } => {
                let operator_str = match operator {
                    LogicalOperator::And => " AND ",
                    LogicalOperator::Or => " OR ",
                };

                let group_conditions = filters
                    .iter()
                    .map(|f| Self::build_condition_sql(f, values, param_counter))
                    .collect::<Vec<_>>()
                    .join(operator_str);

                format!("({})", group_conditions)
            }
            QueryFilter::Not(inner) => {
                format!("NOT ({})", Self::build_condition_sql(inner, values, param_counter))
            }
        }
    }

    fn push_param(value: &Value, values: &mut Vec<Value>, param_counter: &mut i32) -> String {
        values.push(value.clone());
        let param = format!("${}", param_counter);
        *param_counter += 1;
        param
    }

    fn push_params(array: &[Value], values: &mut Vec<Value>, param_counter: &mut i32) -> String {
        array
            .iter()
            .map(|value| Self::push_param(value, values, param_counter))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn build_single_condition_sql(
        condition: &QueryCondition,
        values: &mut Vec<Value>,
        param_counter: &mut i32,
    ) -> String {
        let field = &condition.field;
        let value = condition.value.as_ref().filter(|v| !v.is_null());

        match (&condition.operator, value) {
            (QueryOperator::Eq, None) | (QueryOperator::IsNull, _) => {
                format!("{} IS NULL", field)
            }
            (QueryOperator::Ne, None) | (QueryOperator::IsNotNull, _) => {
                format!("{} IS NOT NULL", field)
            }
            (QueryOperator::In, Some(Value::Array(array))) => {
                if array.is_empty() {
                    return "1=0".to_string(); // Empty IN clause
                }
                format!("{} IN ({})", field, Self::push_params(array, values, param_counter))
            }
            (QueryOperator::NotIn, Some(Value::Array(array))) => {
                if array.is_empty() {
                    return "1=1".to_string(); // Empty NOT IN clause
                }
                format!(
                    "{} NOT IN ({})",
                    field,
                    Self::push_params(array, values, param_counter)
                )
            }
            (QueryOperator::NotIn, _) => "1=1".to_string(),
            (QueryOperator::ArrayOverlap, Some(Value::Array(array))) if !array.is_empty() => {
                format!(
                    "{} && ARRAY[{}]",
                    field,
                    Self::push_params(array, values, param_counter)
                )
            }
            (QueryOperator::In | QueryOperator::ArrayOverlap, _) => "1=0".to_string(),
            (operator, Some(value)) => {
                let symbol = match operator {
                    QueryOperator::Eq => "=",
                    QueryOperator::Ne => "!=",
                    QueryOperator::Gt => ">",
                    QueryOperator::Gte => ">=",
                    QueryOperator::Lt => "<",
                    QueryOperator::Lte => "<=",
                    QueryOperator::Like => "LIKE",
                    QueryOperator::ILike => "ILIKE",
                    _ => return "1=0".to_string(),
                };
                let param = Self::push_param(value, values, param_counter);
                format!("{} {} {}", field, symbol, param)
            }
            (_, None) => "1=0".to_string(), // Comparison without a value
        }
    }

    /// Build ORDER BY clause
    pub fn build_order_clause(order_by: &[OrderKey]) -> String {
        if order_by.is_empty() {
            return String::new();
        }

        let order_items: Vec<String> = order_by
            .iter()
            .map(|key| format!("{} {}", key.field, key.order.to_sql()))
            .collect();

        format!("ORDER BY {}", order_items.join(", "))
    }

    /// Build LIMIT/OFFSET clause
    pub fn build_limit_clause(limit: Option<u64>, offset: Option<u64>) -> String {
        let mut clauses = Vec::new();

        if let Some(limit) = limit {
            clauses.push(format!("LIMIT {}", limit));
        }

        if let Some(offset) = offset {
            clauses.push(format!("OFFSET {}", offset));
        }

        clauses.join(" ")
    }
}
