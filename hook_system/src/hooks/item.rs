//! Item hooks transform each inbound item before it becomes an entity

use crate::context::RequestContext;
use async_trait::async_trait;
use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

#[async_trait]
pub trait ItemHook<R: ?Sized + Sync, I: Send + 'static>: Send + Sync {
    async fn run(&self, request: &R, item: I, ctx: &RequestContext) -> anyhow::Result<I>;

    fn name(&self) -> &str {
        type_name::<Self>()
    }
}

pub struct FnItemHook<F> {
    function: F,
    name: &'static str,
}

impl<F> FnItemHook<F> {
    pub fn new(function: F) -> Self {
        Self {
            function,
            name: type_name::<F>(),
        }
    }
}

#[async_trait]
impl<R, I, F> ItemHook<R, I> for FnItemHook<F>
where
    R: ?Sized + Sync,
    I: Send + 'static,
    F: Fn(&R, I) -> anyhow::Result<I> + Send + Sync,
{
    async fn run(&self, request: &R, item: I, _ctx: &RequestContext) -> anyhow::Result<I> {
        (self.function)(request, item)
    }

    fn name(&self) -> &str {
        self.name
    }
}

pub struct ResolvedItemHook<H> {
    _phantom: PhantomData<fn() -> H>,
}

impl<H> ResolvedItemHook<H> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<H> Default for ResolvedItemHook<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R, I, H> ItemHook<R, I> for ResolvedItemHook<H>
where
    R: ?Sized + Sync,
    I: Send + 'static,
    H: ItemHook<R, I> + 'static,
{
    async fn run(&self, request: &R, item: I, ctx: &RequestContext) -> anyhow::Result<I> {
        let hook = ctx.resolve::<H>()?;
        hook.run(request, item, ctx).await
    }

    fn name(&self) -> &str {
        type_name::<H>()
    }
}

/// Item hook registered for an ancestor request type
pub struct UpcastItemHook<R: ?Sized, B: ?Sized + Sync, I: Send + 'static> {
    inner: Arc<dyn ItemHook<B, I>>,
    upcast: fn(&R) -> &B,
}

impl<R: ?Sized, B: ?Sized + Sync, I: Send + 'static> UpcastItemHook<R, B, I> {
    pub fn new(inner: Arc<dyn ItemHook<B, I>>, upcast: fn(&R) -> &B) -> Self {
        Self { inner, upcast }
    }
}

#[async_trait]
impl<R, B, I> ItemHook<R, I> for UpcastItemHook<R, B, I>
where
    R: ?Sized + Sync + 'static,
    B: ?Sized + Sync + 'static,
    I: Send + 'static,
{
    async fn run(&self, request: &R, item: I, ctx: &RequestContext) -> anyhow::Result<I> {
        self.inner.run((self.upcast)(request), item, ctx).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
