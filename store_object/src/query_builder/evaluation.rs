//! In-memory evaluation of staged queries over JSON rows

use crate::query_builder::builder::{QueryBuilder, QueryStage};
use crate::query_builder::filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::ordering::{OrderKey, SortOrder};
use serde_json::{Map, Value};
use std::cmp::Ordering;

impl QueryBuilder {
    /// Run every stage in order over `rows`, then apply the projection
    pub fn apply(&self, mut rows: Vec<Value>) -> Vec<Value> {
        let mut ordering: Vec<OrderKey> = Vec::new();

        for stage in &self.stages {
            match stage {
                QueryStage::Filter(filter) => rows.retain(|row| filter.matches(row)),
                QueryStage::OrderBy(key) => {
                    ordering = vec![key.clone()];
                    sort_rows(&mut rows, &ordering);
                }
                QueryStage::ThenBy(key) => {
                    ordering.push(key.clone());
                    sort_rows(&mut rows, &ordering);
                }
                QueryStage::Skip(count) => {
                    let count = usize::try_from(*count).unwrap_or(usize::MAX).min(rows.len());
                    rows.drain(..count);
                }
                QueryStage::Take(count) => {
                    rows.truncate(usize::try_from(*count).unwrap_or(usize::MAX));
                }
            }
        }

        match &self.select {
            Some(fields) => rows.into_iter().map(|row| project(row, fields)).collect(),
            None => rows,
        }
    }

    /// Number of rows [`QueryBuilder::apply`] would return
    pub fn count(&self, rows: Vec<Value>) -> usize {
        let unprojected = Self {
            stages: self.stages.clone(),
            select: None,
        };
        unprojected.apply(rows).len()
    }
}

impl QueryFilter {
    /// Evaluate the predicate against one JSON row
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            QueryFilter::Condition(condition) => condition.matches(row),
            QueryFilter::Group {
                operator: LogicalOperator::And,
                filters,
            } => filters.iter().all(|filter| filter.matches(row)),
            QueryFilter::Group {
                operator: LogicalOperator::Or,
                filters,
            } => filters.iter().any(|filter| filter.matches(row)),
            QueryFilter::Not(inner) => !inner.matches(row),
        }
    }
}

impl QueryCondition {
    fn matches(&self, row: &Value) -> bool {
        let actual = field_value(row, &self.field).filter(|v| !v.is_null());
        let expected = self.value.as_ref().filter(|v| !v.is_null());

        match (&self.operator, actual, expected) {
            (QueryOperator::IsNull, actual, _) | (QueryOperator::Eq, actual, None) => {
                actual.is_none()
            }
            (QueryOperator::IsNotNull, actual, _) | (QueryOperator::Ne, actual, None) => {
                actual.is_some()
            }
            // Comparisons against a missing value are unknown, hence false
            (QueryOperator::NotIn, None, _) => false,
            (QueryOperator::NotIn, Some(_), None) => true,
            (_, None, _) | (_, _, None) => false,
            (QueryOperator::Eq, Some(a), Some(b)) => values_equal(a, b),
            (QueryOperator::Ne, Some(a), Some(b)) => !values_equal(a, b),
            (QueryOperator::Gt, Some(a), Some(b)) => compare(a, b) == Some(Ordering::Greater),
            (QueryOperator::Gte, Some(a), Some(b)) => {
                matches!(compare(a, b), Some(Ordering::Greater | Ordering::Equal))
            }
            (QueryOperator::Lt, Some(a), Some(b)) => compare(a, b) == Some(Ordering::Less),
            (QueryOperator::Lte, Some(a), Some(b)) => {
                matches!(compare(a, b), Some(Ordering::Less | Ordering::Equal))
            }
            (QueryOperator::Like, Some(Value::String(a)), Some(Value::String(p))) => {
                like(a, p)
            }
            (QueryOperator::ILike, Some(Value::String(a)), Some(Value::String(p))) => {
                like(&a.to_lowercase(), &p.to_lowercase())
            }
            (QueryOperator::Like | QueryOperator::ILike, _, _) => false,
            (QueryOperator::In, Some(a), Some(Value::Array(candidates))) => {
                candidates.iter().any(|c| values_equal(a, c))
            }
            (QueryOperator::NotIn, Some(a), Some(Value::Array(candidates))) => {
                !candidates.iter().any(|c| values_equal(a, c))
            }
            (QueryOperator::ArrayOverlap, Some(Value::Array(a)), Some(Value::Array(b))) => {
                a.iter().any(|x| b.iter().any(|y| values_equal(x, y)))
            }
            (QueryOperator::In | QueryOperator::NotIn | QueryOperator::ArrayOverlap, _, _) => {
                false
            }
        }
    }
}

/// Look up a possibly dotted field path
pub(crate) fn field_value<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(row, |current, segment| current.get(segment))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Comparison of two non-null values of the same kind
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order used for sorting: null < bool < number < string < array < object
fn sort_compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    type_rank(a)
        .cmp(&type_rank(b))
        .then_with(|| compare(a, b).unwrap_or(Ordering::Equal))
}

fn sort_rows(rows: &mut [Value], ordering: &[OrderKey]) {
    rows.sort_by(|a, b| {
        ordering.iter().fold(Ordering::Equal, |acc, key| {
            acc.then_with(|| {
                let ord = sort_compare(field_value(a, &key.field), field_value(b, &key.field));
                match key.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            })
        })
    });
}

fn project(row: Value, fields: &[String]) -> Value {
    let Value::Object(mut source) = row else {
        return row;
    };
    let mut projected = Map::new();
    for field in fields {
        if let Some(value) = source.remove(field) {
            projected.insert(field.clone(), value);
        }
    }
    Value::Object(projected)
}

/// SQL LIKE matching: `%` is any run of characters, `_` is exactly one
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}
