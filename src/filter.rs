//! Filter engine
//!
//! Filters are query transforms applied strictly in registration order, each
//! seeing the query produced by the ones before it.

use hook_system::RequestContext;
use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;
use store_object::QueryBuilder;

pub trait RequestFilter<R: ?Sized>: Send + Sync {
    fn apply(
        &self,
        request: &R,
        query: QueryBuilder,
        ctx: &RequestContext,
    ) -> anyhow::Result<QueryBuilder>;
}

pub struct FnFilter<F> {
    function: F,
}

impl<F> FnFilter<F> {
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

impl<R, F> RequestFilter<R> for FnFilter<F>
where
    R: ?Sized,
    F: Fn(&R, QueryBuilder) -> anyhow::Result<QueryBuilder> + Send + Sync,
{
    fn apply(
        &self,
        request: &R,
        query: QueryBuilder,
        _ctx: &RequestContext,
    ) -> anyhow::Result<QueryBuilder> {
        (self.function)(request, query)
    }
}

/// Runs `inner` only when the predicate holds for the request
pub struct ConditionalFilter<R: ?Sized> {
    predicate: Arc<dyn Fn(&R) -> bool + Send + Sync>,
    inner: Arc<dyn RequestFilter<R>>,
}

impl<R: ?Sized> ConditionalFilter<R> {
    pub fn new(
        predicate: Arc<dyn Fn(&R) -> bool + Send + Sync>,
        inner: Arc<dyn RequestFilter<R>>,
    ) -> Self {
        Self { predicate, inner }
    }
}

impl<R: ?Sized> RequestFilter<R> for ConditionalFilter<R> {
    fn apply(
        &self,
        request: &R,
        query: QueryBuilder,
        ctx: &RequestContext,
    ) -> anyhow::Result<QueryBuilder> {
        if (self.predicate)(request) {
            self.inner.apply(request, query, ctx)
        } else {
            Ok(query)
        }
    }
}

/// Filter resolved from the request services on every application
pub struct ResolvedFilter<F> {
    _phantom: PhantomData<fn() -> F>,
}

impl<F> ResolvedFilter<F> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<F> Default for ResolvedFilter<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, F> RequestFilter<R> for ResolvedFilter<F>
where
    R: ?Sized,
    F: RequestFilter<R> + 'static,
{
    fn apply(
        &self,
        request: &R,
        query: QueryBuilder,
        ctx: &RequestContext,
    ) -> anyhow::Result<QueryBuilder> {
        let filter = ctx.resolve::<F>().map_err(|e| {
            anyhow::anyhow!("filter {} unavailable: {}", type_name::<F>(), e)
        })?;
        filter.apply(request, query, ctx)
    }
}

/// Filter registered for an ancestor request type
pub struct UpcastFilter<R: ?Sized, B: ?Sized> {
    inner: Arc<dyn RequestFilter<B>>,
    upcast: fn(&R) -> &B,
}

impl<R: ?Sized, B: ?Sized> UpcastFilter<R, B> {
    pub fn new(inner: Arc<dyn RequestFilter<B>>, upcast: fn(&R) -> &B) -> Self {
        Self { inner, upcast }
    }
}

impl<R: ?Sized, B: ?Sized> RequestFilter<R> for UpcastFilter<R, B> {
    fn apply(
        &self,
        request: &R,
        query: QueryBuilder,
        ctx: &RequestContext,
    ) -> anyhow::Result<QueryBuilder> {
        self.inner.apply((self.upcast)(request), query, ctx)
    }
}

/// Left fold of `filters` over `query`
pub fn apply_filters<R: ?Sized>(
    filters: &[Arc<dyn RequestFilter<R>>],
    request: &R,
    query: QueryBuilder,
    ctx: &RequestContext,
) -> anyhow::Result<QueryBuilder> {
    filters
        .iter()
        .try_fold(query, |query, filter| filter.apply(request, query, ctx))
}
