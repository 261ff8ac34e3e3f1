//! Fluent construction of profiles

use super::{Erased, Profile};
use crate::error_handler::ErrorHandler;
use crate::filter::{ConditionalFilter, FnFilter, RequestFilter, ResolvedFilter};
use crate::key::Key;
use crate::request_config::{EntityCreator, EntityUpdater, ResultCreator};
use crate::selector::Selector;
use crate::sorter::{FnSorter, RequestSorter, ResolvedSorter};
use futures::future::BoxFuture;
use hook_system::{
    ActionType, EntityHook, FnEntityHook, FnItemHook, FnRequestHook, FnResultHook, ItemHook,
    RequestHook, ResolvedEntityHook, ResolvedItemHook, ResolvedRequestHook, ResolvedResultHook,
    ResultHook,
};
use std::future::Future;
use std::sync::Arc;
use store_object::{Entity, QueryBuilder, QueryFilter};

impl<R, E> Profile<R, E>
where
    R: ?Sized + Sync + 'static,
    E: ?Sized + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_key(mut self, key: Key<E>) -> Self {
        self.entity_key = Some(key);
        self
    }

    pub fn request_key(mut self, key: Key<R>) -> Self {
        self.request_key = Some(key);
        self
    }

    /// Key of the request's items; `I` must be the item type of the requests
    /// this profile applies to
    pub fn item_key<I: 'static>(mut self, key: Key<I>) -> Self {
        self.item_key = Some(Arc::new(key) as Erased);
        self
    }

    pub fn select<F>(mut self, select: F) -> Self
    where
        F: Fn(&R) -> QueryFilter + Send + Sync + 'static,
    {
        self.selector = Some(Selector::bind::<R, F>(select));
        self
    }

    // Filters

    pub fn filter<F>(self, filter: F) -> Self
    where
        F: Fn(&R, QueryBuilder) -> anyhow::Result<QueryBuilder> + Send + Sync + 'static,
    {
        self.filter_instance(Arc::new(FnFilter::new(filter)))
    }

    /// Filter skipped when `predicate` is false for the request
    pub fn filter_when<P, F>(self, predicate: P, filter: F) -> Self
    where
        P: Fn(&R) -> bool + Send + Sync + 'static,
        F: Fn(&R, QueryBuilder) -> anyhow::Result<QueryBuilder> + Send + Sync + 'static,
    {
        let inner: Arc<dyn RequestFilter<R>> = Arc::new(FnFilter::new(filter));
        self.filter_instance(Arc::new(ConditionalFilter::new(Arc::new(predicate), inner)))
    }

    pub fn filter_instance(mut self, filter: Arc<dyn RequestFilter<R>>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filter_resolved<F: RequestFilter<R> + 'static>(self) -> Self {
        self.filter_instance(Arc::new(ResolvedFilter::<F>::new()))
    }

    // Sorting

    pub fn sorter<S: RequestSorter<R> + 'static>(self, sorter: S) -> Self {
        self.sorter_instance(Arc::new(sorter))
    }

    pub fn sort_with<F>(self, sort: F) -> Self
    where
        F: Fn(&R, QueryBuilder) -> anyhow::Result<Option<QueryBuilder>> + Send + Sync + 'static,
    {
        self.sorter_instance(Arc::new(FnSorter::new(sort)))
    }

    pub fn sorter_instance(mut self, sorter: Arc<dyn RequestSorter<R>>) -> Self {
        self.sorter = Some(sorter);
        self
    }

    pub fn sorter_resolved<S: RequestSorter<R> + 'static>(self) -> Self {
        self.sorter_instance(Arc::new(ResolvedSorter::<S>::new()))
    }

    // Request hooks

    pub fn request_hook<F>(self, hook: F) -> Self
    where
        F: Fn(&R) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.request_hook_instance(Arc::new(FnRequestHook::new(hook)))
    }

    pub fn request_hook_instance(mut self, hook: Arc<dyn RequestHook<R>>) -> Self {
        self.request_hooks.push(hook);
        self
    }

    pub fn request_hook_resolved<H: RequestHook<R> + 'static>(self) -> Self {
        self.request_hook_instance(Arc::new(ResolvedRequestHook::<H>::new()))
    }

    // Entity hooks

    pub fn entity_hook<F>(self, hook: F) -> Self
    where
        F: Fn(&R, &mut E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.entity_hook_instance(Arc::new(FnEntityHook::new(hook)))
    }

    pub fn entity_hook_instance(mut self, hook: Arc<dyn EntityHook<R, E>>) -> Self {
        self.entity_hooks.push(hook);
        self
    }

    pub fn entity_hook_resolved<H: EntityHook<R, E> + 'static>(self) -> Self {
        self.entity_hook_instance(Arc::new(ResolvedEntityHook::<H>::new()))
    }

    // Item hooks, typed by the item they transform

    pub fn item_hook<I, F>(self, hook: F) -> Self
    where
        I: Send + 'static,
        F: Fn(&R, I) -> anyhow::Result<I> + Send + Sync + 'static,
    {
        self.item_hook_instance::<I>(Arc::new(FnItemHook::new(hook)))
    }

    pub fn item_hook_instance<I: Send + 'static>(mut self, hook: Arc<dyn ItemHook<R, I>>) -> Self {
        self.item_hooks.push(Arc::new(hook) as Erased);
        self
    }

    pub fn item_hook_resolved<I, H>(self) -> Self
    where
        I: Send + 'static,
        H: ItemHook<R, I> + 'static,
    {
        self.item_hook_instance::<I>(Arc::new(ResolvedItemHook::<H>::new()))
    }

    // Result hooks, typed by the result they transform

    pub fn result_hook<O, F>(self, hook: F) -> Self
    where
        O: Send + 'static,
        F: Fn(&R, O) -> anyhow::Result<O> + Send + Sync + 'static,
    {
        self.result_hook_instance::<O>(Arc::new(FnResultHook::new(hook)))
    }

    pub fn result_hook_instance<O: Send + 'static>(
        mut self,
        hook: Arc<dyn ResultHook<R, O>>,
    ) -> Self {
        self.result_hooks.push(Arc::new(hook) as Erased);
        self
    }

    pub fn result_hook_resolved<O, H>(self) -> Self
    where
        O: Send + 'static,
        H: ResultHook<R, O> + 'static,
    {
        self.result_hook_instance::<O>(Arc::new(ResolvedResultHook::<H>::new()))
    }

    // Actions

    pub fn pre_action<F>(mut self, action: ActionType, pre: F) -> Self
    where
        F: Fn(&R) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.pre_actions.push((action, Arc::new(pre)));
        self
    }

    pub fn post_action<F>(mut self, action: ActionType, post: F) -> Self
    where
        F: Fn(&mut E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.post_actions.push((action, Arc::new(post)));
        self
    }

    // Error handling and flags

    pub fn error_handler<H: ErrorHandler + 'static>(mut self, handler: H) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn failed_to_find_is_error(mut self, enabled: bool) -> Self {
        self.options.failed_to_find_is_error = Some(enabled);
        self
    }

    pub fn use_projection(mut self, enabled: bool) -> Self {
        self.options.use_projection = Some(enabled);
        self
    }

    pub fn emit_signals(mut self, enabled: bool) -> Self {
        self.options.emit_signals = Some(enabled);
        self
    }
}

/// Settings that produce or consume entities by value
impl<R, E> Profile<R, E>
where
    R: ?Sized + Sync + 'static,
    E: Entity,
{
    pub fn creator<I, F>(self, create: F) -> Self
    where
        I: Send + 'static,
        F: Fn(I) -> anyhow::Result<E> + Send + Sync + 'static,
    {
        self.creator_async(move |item: I| std::future::ready(create(item)))
    }

    pub fn creator_async<I, F, Fut>(mut self, create: F) -> Self
    where
        I: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<E>> + Send + 'static,
    {
        let creator: EntityCreator<I, E> =
            Arc::new(move |item: I| -> BoxFuture<'static, anyhow::Result<E>> {
                Box::pin(create(item))
            });
        self.creator = Some(Arc::new(creator) as Erased);
        self
    }

    pub fn updater<I, F>(self, update: F) -> Self
    where
        I: Send + 'static,
        F: Fn(I, E) -> anyhow::Result<E> + Send + Sync + 'static,
    {
        self.updater_async(move |item: I, entity: E| std::future::ready(update(item, entity)))
    }

    pub fn updater_async<I, F, Fut>(mut self, update: F) -> Self
    where
        I: Send + 'static,
        F: Fn(I, E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<E>> + Send + 'static,
    {
        let updater: EntityUpdater<I, E> =
            Arc::new(move |item: I, entity: E| -> BoxFuture<'static, anyhow::Result<E>> {
                Box::pin(update(item, entity))
            });
        self.updater = Some(Arc::new(updater) as Erased);
        self
    }

    /// Entity returned by Get-family requests when nothing matches
    pub fn default_value(mut self, value: E) -> Self {
        self.default_value = Some(Arc::new(value) as Erased);
        self
    }

    /// Build results with `create` instead of the object mapper
    pub fn result_creator<O, F>(mut self, create: F) -> Self
    where
        O: 'static,
        F: Fn(&E) -> anyhow::Result<O> + Send + Sync + 'static,
    {
        let creator: ResultCreator<E, O> = Arc::new(create);
        self.result_creator = Some(Arc::new(creator) as Erased);
        self
    }
}
