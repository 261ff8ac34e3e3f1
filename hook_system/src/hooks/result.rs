//! Result hooks transform the produced result before it is returned

use crate::context::RequestContext;
use async_trait::async_trait;
use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

#[async_trait]
pub trait ResultHook<R: ?Sized + Sync, T: Send + 'static>: Send + Sync {
    async fn run(&self, request: &R, result: T, ctx: &RequestContext) -> anyhow::Result<T>;

    fn name(&self) -> &str {
        type_name::<Self>()
    }
}

pub struct FnResultHook<F> {
    function: F,
    name: &'static str,
}

impl<F> FnResultHook<F> {
    pub fn new(function: F) -> Self {
        Self {
            function,
            name: type_name::<F>(),
        }
    }
}

#[async_trait]
impl<R, T, F> ResultHook<R, T> for FnResultHook<F>
where
    R: ?Sized + Sync,
    T: Send + 'static,
    F: Fn(&R, T) -> anyhow::Result<T> + Send + Sync,
{
    async fn run(&self, request: &R, result: T, _ctx: &RequestContext) -> anyhow::Result<T> {
        (self.function)(request, result)
    }

    fn name(&self) -> &str {
        self.name
    }
}

pub struct ResolvedResultHook<H> {
    _phantom: PhantomData<fn() -> H>,
}

impl<H> ResolvedResultHook<H> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<H> Default for ResolvedResultHook<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R, T, H> ResultHook<R, T> for ResolvedResultHook<H>
where
    R: ?Sized + Sync,
    T: Send + 'static,
    H: ResultHook<R, T> + 'static,
{
    async fn run(&self, request: &R, result: T, ctx: &RequestContext) -> anyhow::Result<T> {
        let hook = ctx.resolve::<H>()?;
        hook.run(request, result, ctx).await
    }

    fn name(&self) -> &str {
        type_name::<H>()
    }
}

/// Result hook registered for an ancestor request type
pub struct UpcastResultHook<R: ?Sized, B: ?Sized + Sync, T: Send + 'static> {
    inner: Arc<dyn ResultHook<B, T>>,
    upcast: fn(&R) -> &B,
}

impl<R: ?Sized, B: ?Sized + Sync, T: Send + 'static> UpcastResultHook<R, B, T> {
    pub fn new(inner: Arc<dyn ResultHook<B, T>>, upcast: fn(&R) -> &B) -> Self {
        Self { inner, upcast }
    }
}

#[async_trait]
impl<R, B, T> ResultHook<R, T> for UpcastResultHook<R, B, T>
where
    R: ?Sized + Sync + 'static,
    B: ?Sized + Sync + 'static,
    T: Send + 'static,
{
    async fn run(&self, request: &R, result: T, ctx: &RequestContext) -> anyhow::Result<T> {
        self.inner.run((self.upcast)(request), result, ctx).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
