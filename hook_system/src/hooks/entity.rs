//! Entity hooks run against each entity a request touches

use crate::context::RequestContext;
use async_trait::async_trait;
use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

#[async_trait]
pub trait EntityHook<R: ?Sized + Sync, E: ?Sized + Send>: Send + Sync {
    async fn run(&self, request: &R, entity: &mut E, ctx: &RequestContext) -> anyhow::Result<()>;

    fn name(&self) -> &str {
        type_name::<Self>()
    }
}

pub struct FnEntityHook<F> {
    function: F,
    name: &'static str,
}

impl<F> FnEntityHook<F> {
    pub fn new(function: F) -> Self {
        Self {
            function,
            name: type_name::<F>(),
        }
    }
}

#[async_trait]
impl<R, E, F> EntityHook<R, E> for FnEntityHook<F>
where
    R: ?Sized + Sync,
    E: ?Sized + Send,
    F: Fn(&R, &mut E) -> anyhow::Result<()> + Send + Sync,
{
    async fn run(&self, request: &R, entity: &mut E, _ctx: &RequestContext) -> anyhow::Result<()> {
        (self.function)(request, entity)
    }

    fn name(&self) -> &str {
        self.name
    }
}

pub struct ResolvedEntityHook<H> {
    _phantom: PhantomData<fn() -> H>,
}

impl<H> ResolvedEntityHook<H> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<H> Default for ResolvedEntityHook<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R, E, H> EntityHook<R, E> for ResolvedEntityHook<H>
where
    R: ?Sized + Sync,
    E: ?Sized + Send,
    H: EntityHook<R, E> + 'static,
{
    async fn run(&self, request: &R, entity: &mut E, ctx: &RequestContext) -> anyhow::Result<()> {
        let hook = ctx.resolve::<H>()?;
        hook.run(request, entity, ctx).await
    }

    fn name(&self) -> &str {
        type_name::<H>()
    }
}

/// Runs a hook registered for ancestors of both the request and the entity
pub struct UpcastEntityHook<R: ?Sized, E: ?Sized, BR: ?Sized + Sync, BE: ?Sized + Send> {
    inner: Arc<dyn EntityHook<BR, BE>>,
    request: fn(&R) -> &BR,
    entity: fn(&mut E) -> &mut BE,
}

impl<R: ?Sized, E: ?Sized, BR: ?Sized + Sync, BE: ?Sized + Send> UpcastEntityHook<R, E, BR, BE> {
    pub fn new(
        inner: Arc<dyn EntityHook<BR, BE>>,
        request: fn(&R) -> &BR,
        entity: fn(&mut E) -> &mut BE,
    ) -> Self {
        Self {
            inner,
            request,
            entity,
        }
    }
}

#[async_trait]
impl<R, E, BR, BE> EntityHook<R, E> for UpcastEntityHook<R, E, BR, BE>
where
    R: ?Sized + Sync + 'static,
    E: ?Sized + Send + 'static,
    BR: ?Sized + Sync + 'static,
    BE: ?Sized + Send + 'static,
{
    async fn run(&self, request: &R, entity: &mut E, ctx: &RequestContext) -> anyhow::Result<()> {
        self.inner
            .run((self.request)(request), (self.entity)(entity), ctx)
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
