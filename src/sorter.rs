//! Sorter engine
//!
//! Every sorter returns `None` when it has no order to apply, which is
//! different from returning the query unchanged: callers keep the original
//! query and treat it as unordered.

use hook_system::RequestContext;
use std::any::type_name;
use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use store_object::{QueryBuilder, SortOrder};

pub trait RequestSorter<R: ?Sized>: Send + Sync {
    fn sort(
        &self,
        request: &R,
        query: QueryBuilder,
        ctx: &RequestContext,
    ) -> anyhow::Result<Option<QueryBuilder>>;
}

type RequestPredicate<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

/// A primary sort clause followed by secondary clauses
pub struct SortOperation<R: ?Sized> {
    predicate: Option<RequestPredicate<R>>,
    clauses: Vec<(String, SortOrder)>,
}

impl<R: ?Sized> Clone for SortOperation<R> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            clauses: self.clauses.clone(),
        }
    }
}

impl<R: ?Sized> SortOperation<R> {
    pub fn by(field: &str, order: SortOrder) -> Self {
        Self {
            predicate: None,
            clauses: vec![(field.to_string(), order)],
        }
    }

    pub fn ascending(field: &str) -> Self {
        Self::by(field, SortOrder::Asc)
    }

    pub fn descending(field: &str) -> Self {
        Self::by(field, SortOrder::Desc)
    }

    pub fn then_by(mut self, field: &str, order: SortOrder) -> Self {
        self.clauses.push((field.to_string(), order));
        self
    }

    /// Only applies when `predicate` holds for the request
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    fn applies_to(&self, request: &R) -> bool {
        self.predicate.as_ref().is_none_or(|p| p(request))
    }

    fn apply(&self, query: QueryBuilder) -> Option<QueryBuilder> {
        let ((field, order), rest) = self.clauses.split_first()?;
        let query = rest
            .iter()
            .fold(query.order_by(field, *order), |query, (field, order)| {
                query.then_by(field, *order)
            });
        Some(query)
    }
}

/// The first operation whose predicate holds wins
pub struct BasicSorter<R: ?Sized> {
    operations: Vec<SortOperation<R>>,
}

impl<R: ?Sized> Default for BasicSorter<R> {
    fn default() -> Self {
        Self {
            operations: Vec::new(),
        }
    }
}

impl<R: ?Sized> BasicSorter<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation(mut self, operation: SortOperation<R>) -> Self {
        self.operations.push(operation);
        self
    }
}

impl<R: ?Sized> RequestSorter<R> for BasicSorter<R> {
    fn sort(
        &self,
        request: &R,
        query: QueryBuilder,
        _ctx: &RequestContext,
    ) -> anyhow::Result<Option<QueryBuilder>> {
        Ok(self
            .operations
            .iter()
            .find(|operation| operation.applies_to(request))
            .and_then(|operation| operation.apply(query)))
    }
}

/// Picks an operation by a value extracted from the request
pub struct SwitchSorter<R: ?Sized, K> {
    discriminator: Arc<dyn Fn(&R) -> Option<K> + Send + Sync>,
    cases: HashMap<K, SortOperation<R>>,
    default: Option<SortOperation<R>>,
}

impl<R: ?Sized, K: Eq + Hash> SwitchSorter<R, K> {
    pub fn new<F>(discriminator: F) -> Self
    where
        F: Fn(&R) -> Option<K> + Send + Sync + 'static,
    {
        Self {
            discriminator: Arc::new(discriminator),
            cases: HashMap::new(),
            default: None,
        }
    }

    pub fn case(mut self, value: K, operation: SortOperation<R>) -> Self {
        self.cases.insert(value, operation);
        self
    }

    pub fn default_operation(mut self, operation: SortOperation<R>) -> Self {
        self.default = Some(operation);
        self
    }
}

impl<R: ?Sized, K: Eq + Hash + Send + Sync> RequestSorter<R> for SwitchSorter<R, K> {
    fn sort(
        &self,
        request: &R,
        query: QueryBuilder,
        _ctx: &RequestContext,
    ) -> anyhow::Result<Option<QueryBuilder>> {
        let operation = (self.discriminator)(request)
            .and_then(|value| self.cases.get(&value))
            .or(self.default.as_ref());
        Ok(operation.and_then(|operation| operation.apply(query)))
    }
}

/// Column token and direction read from a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortControl {
    pub token: String,
    pub order: SortOrder,
}

impl SortControl {
    pub fn new(token: impl Into<String>, order: SortOrder) -> Self {
        Self {
            token: token.into(),
            order,
        }
    }
}

type ControlFn<R> = Arc<dyn Fn(&R) -> Option<SortControl> + Send + Sync>;

/// Table-driven sorting: controls name columns through a token map
///
/// The first control with a known token sets the primary order, later ones add
/// secondary orders. Unknown tokens are skipped.
pub struct TableSorter<R: ?Sized> {
    controls: Vec<ControlFn<R>>,
    columns: HashMap<String, String>,
}

impl<R: ?Sized> Default for TableSorter<R> {
    fn default() -> Self {
        Self {
            controls: Vec::new(),
            columns: HashMap::new(),
        }
    }
}

impl<R: ?Sized> TableSorter<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, token: impl Into<String>, field: impl Into<String>) -> Self {
        self.columns.insert(token.into(), field.into());
        self
    }

    pub fn control<F>(mut self, control: F) -> Self
    where
        F: Fn(&R) -> Option<SortControl> + Send + Sync + 'static,
    {
        self.controls.push(Arc::new(control));
        self
    }
}

impl<R: ?Sized> RequestSorter<R> for TableSorter<R> {
    fn sort(
        &self,
        request: &R,
        query: QueryBuilder,
        _ctx: &RequestContext,
    ) -> anyhow::Result<Option<QueryBuilder>> {
        let mut sorted: Option<QueryBuilder> = None;
        let mut query = Some(query);

        for control in &self.controls {
            let Some(SortControl { token, order }) = control(request) else {
                continue;
            };
            let Some(field) = self.columns.get(&token) else {
                crate::trace_log!("skipping unknown sort token {}", token);
                continue;
            };
            sorted = match (sorted, query.take()) {
                (Some(sorted), _) => Some(sorted.then_by(field, order)),
                (None, Some(query)) => Some(query.order_by(field, order)),
                (None, None) => None,
            };
        }

        Ok(sorted)
    }
}

pub struct FnSorter<F> {
    function: F,
}

impl<F> FnSorter<F> {
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

impl<R, F> RequestSorter<R> for FnSorter<F>
where
    R: ?Sized,
    F: Fn(&R, QueryBuilder) -> anyhow::Result<Option<QueryBuilder>> + Send + Sync,
{
    fn sort(
        &self,
        request: &R,
        query: QueryBuilder,
        _ctx: &RequestContext,
    ) -> anyhow::Result<Option<QueryBuilder>> {
        (self.function)(request, query)
    }
}

/// Sorter resolved from the request services
pub struct ResolvedSorter<S> {
    _phantom: PhantomData<fn() -> S>,
}

impl<S> ResolvedSorter<S> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<S> Default for ResolvedSorter<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, S> RequestSorter<R> for ResolvedSorter<S>
where
    R: ?Sized,
    S: RequestSorter<R> + 'static,
{
    fn sort(
        &self,
        request: &R,
        query: QueryBuilder,
        ctx: &RequestContext,
    ) -> anyhow::Result<Option<QueryBuilder>> {
        let sorter = ctx.resolve::<S>().map_err(|e| {
            anyhow::anyhow!("sorter {} unavailable: {}", type_name::<S>(), e)
        })?;
        sorter.sort(request, query, ctx)
    }
}

pub struct UpcastSorter<R: ?Sized, B: ?Sized> {
    inner: Arc<dyn RequestSorter<B>>,
    upcast: fn(&R) -> &B,
}

impl<R: ?Sized, B: ?Sized> UpcastSorter<R, B> {
    pub fn new(inner: Arc<dyn RequestSorter<B>>, upcast: fn(&R) -> &B) -> Self {
        Self { inner, upcast }
    }
}

impl<R: ?Sized, B: ?Sized> RequestSorter<R> for UpcastSorter<R, B> {
    fn sort(
        &self,
        request: &R,
        query: QueryBuilder,
        ctx: &RequestContext,
    ) -> anyhow::Result<Option<QueryBuilder>> {
        self.inner.sort((self.upcast)(request), query, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    struct Listing {
        newest_first: bool,
        mode: Option<&'static str>,
        sort: Vec<(&'static str, SortOrder)>,
    }

    impl Listing {
        fn new() -> Self {
            Self {
                newest_first: false,
                mode: None,
                sort: Vec::new(),
            }
        }
    }

    fn rows() -> Vec<Value> {
        vec![
            json!({ "id": 1, "name": "b", "age": 30 }),
            json!({ "id": 2, "name": "a", "age": 30 }),
            json!({ "id": 3, "name": "c", "age": 20 }),
        ]
    }

    fn ids(query: &QueryBuilder) -> Vec<i64> {
        query
            .apply(rows())
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect()
    }

    fn sort(sorter: &dyn RequestSorter<Listing>, request: &Listing) -> Option<QueryBuilder> {
        sorter
            .sort(request, QueryBuilder::new(), &RequestContext::new())
            .unwrap()
    }

    #[test]
    fn test_basic_first_matching_operation_wins() {
        let sorter = BasicSorter::new()
            .operation(SortOperation::descending("id").when(|r: &Listing| r.newest_first))
            .operation(SortOperation::ascending("age").then_by("name", SortOrder::Asc))
            .operation(SortOperation::ascending("name"));

        let mut request = Listing::new();
        assert_eq!(ids(&sort(&sorter, &request).unwrap()), vec![3, 2, 1]);

        request.newest_first = true;
        assert_eq!(ids(&sort(&sorter, &request).unwrap()), vec![3, 2, 1]);
        assert_eq!(
            sort(&sorter, &request).unwrap().stages().len(),
            1,
            "later operations must not be consulted"
        );
    }

    #[test]
    fn test_basic_without_match_is_none() {
        let sorter =
            BasicSorter::new().operation(SortOperation::ascending("id").when(|r: &Listing| r.newest_first));
        assert!(sort(&sorter, &Listing::new()).is_none());
    }

    #[test]
    fn test_switch() {
        let sorter = SwitchSorter::new(|r: &Listing| r.mode)
            .case("name", SortOperation::ascending("name"))
            .case("age", SortOperation::descending("age").then_by("id", SortOrder::Desc));

        let mut request = Listing::new();
        assert!(sort(&sorter, &request).is_none());

        request.mode = Some("age");
        assert_eq!(ids(&sort(&sorter, &request).unwrap()), vec![2, 1, 3]);

        request.mode = Some("unknown");
        assert!(sort(&sorter, &request).is_none());

        let sorter = sorter.default_operation(SortOperation::descending("id"));
        assert_eq!(ids(&sort(&sorter, &request).unwrap()), vec![3, 2, 1]);
    }

    fn table_sorter() -> TableSorter<Listing> {
        let control = |index: usize| {
            move |r: &Listing| {
                r.sort
                    .get(index)
                    .map(|(token, order)| SortControl::new(*token, *order))
            }
        };
        TableSorter::new()
            .column("Name", "name")
            .column("Age", "age")
            .column("Id", "id")
            .control(control(0))
            .control(control(1))
            .control(control(2))
    }

    #[test]
    fn test_table_applies_controls_in_order() {
        let mut request = Listing::new();
        request.sort = vec![("Age", SortOrder::Desc), ("Name", SortOrder::Asc)];
        assert_eq!(ids(&sort(&table_sorter(), &request).unwrap()), vec![2, 1, 3]);
    }

    #[test]
    fn test_table_skips_unknown_tokens() {
        let mut request = Listing::new();
        request.sort = vec![
            ("Age", SortOrder::Desc),
            ("Shoe size", SortOrder::Asc),
            ("Id", SortOrder::Desc),
        ];
        let sorted = sort(&table_sorter(), &request).unwrap();
        assert_eq!(sorted.stages().len(), 2);
        assert_eq!(ids(&sorted), vec![2, 1, 3]);

        request.sort = vec![("Shoe size", SortOrder::Asc), ("Name", SortOrder::Desc)];
        assert_eq!(ids(&sort(&table_sorter(), &request).unwrap()), vec![3, 1, 2]);

        request.sort = vec![("Shoe size", SortOrder::Asc)];
        assert!(sort(&table_sorter(), &request).is_none());
    }
}
