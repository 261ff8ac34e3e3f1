//! Request hooks run once per request, before anything else

use crate::context::RequestContext;
use async_trait::async_trait;
use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

#[async_trait]
pub trait RequestHook<R: ?Sized + Sync>: Send + Sync {
    async fn run(&self, request: &R, ctx: &RequestContext) -> anyhow::Result<()>;

    fn name(&self) -> &str {
        type_name::<Self>()
    }
}

/// Hook built from a plain function
pub struct FnRequestHook<F> {
    function: F,
    name: &'static str,
}

impl<F> FnRequestHook<F> {
    pub fn new(function: F) -> Self {
        Self {
            function,
            name: type_name::<F>(),
        }
    }
}

#[async_trait]
impl<R, F> RequestHook<R> for FnRequestHook<F>
where
    R: ?Sized + Sync,
    F: Fn(&R) -> anyhow::Result<()> + Send + Sync,
{
    async fn run(&self, request: &R, _ctx: &RequestContext) -> anyhow::Result<()> {
        (self.function)(request)
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Hook resolved from the request's services each time it runs
pub struct ResolvedRequestHook<H> {
    _phantom: PhantomData<fn() -> H>,
}

impl<H> ResolvedRequestHook<H> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<H> Default for ResolvedRequestHook<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R, H> RequestHook<R> for ResolvedRequestHook<H>
where
    R: ?Sized + Sync,
    H: RequestHook<R> + 'static,
{
    async fn run(&self, request: &R, ctx: &RequestContext) -> anyhow::Result<()> {
        let hook = ctx.resolve::<H>()?;
        hook.run(request, ctx).await
    }

    fn name(&self) -> &str {
        type_name::<H>()
    }
}

/// Runs a hook written for an ancestor `B` of the request type `D`
pub struct UpcastRequestHook<D: ?Sized, B: ?Sized + Sync> {
    inner: Arc<dyn RequestHook<B>>,
    upcast: fn(&D) -> &B,
}

impl<D: ?Sized, B: ?Sized + Sync> UpcastRequestHook<D, B> {
    pub fn new(inner: Arc<dyn RequestHook<B>>, upcast: fn(&D) -> &B) -> Self {
        Self { inner, upcast }
    }
}

#[async_trait]
impl<D, B> RequestHook<D> for UpcastRequestHook<D, B>
where
    D: ?Sized + Sync + 'static,
    B: ?Sized + Sync + 'static,
{
    async fn run(&self, request: &D, ctx: &RequestContext) -> anyhow::Result<()> {
        self.inner.run((self.upcast)(request), ctx).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
