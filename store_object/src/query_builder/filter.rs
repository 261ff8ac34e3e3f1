//! Filter predicates
//!
//! Predicates are plain data so the same tree can be evaluated in memory or
//! compiled to a SQL `WHERE` clause.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    /// Case-insensitive `Like`
    ILike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    /// Array field sharing at least one element with the operand
    ArrayOverlap,
}

/// One operator applied to one field
///
/// `value` is `None` for the null checks; `Eq`/`Ne` against `None` behave as
/// `IsNull`/`IsNotNull`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCondition {
    pub field: String,
    pub operator: QueryOperator,
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Predicate tree; an empty `And` group matches everything, an empty `Or` nothing
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    Condition(QueryCondition),
    Group {
        operator: LogicalOperator,
        filters: Vec<QueryFilter>,
    },
    Not(Box<QueryFilter>),
}

macro_rules! comparisons {
    ($($name:ident => $operator:ident),* $(,)?) => {
        $(
            pub fn $name(field: &str, value: Value) -> Self {
                Self::condition(field, QueryOperator::$operator, Some(value))
            }
        )*
    };
}

impl QueryFilter {
    pub fn condition(field: &str, operator: QueryOperator, value: Option<Value>) -> Self {
        Self::Condition(QueryCondition {
            field: field.to_string(),
            operator,
            value,
        })
    }

    comparisons! {
        eq => Eq,
        ne => Ne,
        gt => Gt,
        gte => Gte,
        lt => Lt,
        lte => Lte,
    }

    pub fn like(field: &str, pattern: &str) -> Self {
        Self::condition(field, QueryOperator::Like, Some(pattern.into()))
    }

    pub fn ilike(field: &str, pattern: &str) -> Self {
        Self::condition(field, QueryOperator::ILike, Some(pattern.into()))
    }

    pub fn in_values(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::In, Some(Value::Array(values)))
    }

    pub fn not_in_values(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::NotIn, Some(Value::Array(values)))
    }

    pub fn overlaps(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::ArrayOverlap, Some(Value::Array(values)))
    }

    pub fn is_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNull, None)
    }

    pub fn is_not_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNotNull, None)
    }

    pub fn and(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            filters,
        }
    }

    pub fn or(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            filters,
        }
    }

    pub fn negate(filter: QueryFilter) -> Self {
        Self::Not(Box::new(filter))
    }

    pub fn always() -> Self {
        Self::and(Vec::new())
    }

    pub fn never() -> Self {
        Self::or(Vec::new())
    }

    /// Every field the predicate reads, in tree order
    pub fn fields(&self) -> Vec<&str> {
        match self {
            QueryFilter::Condition(condition) => vec![condition.field.as_str()],
            QueryFilter::Group { filters, .. } => {
                filters.iter().flat_map(QueryFilter::fields).collect()
            }
            QueryFilter::Not(inner) => inner.fields(),
        }
    }
}
