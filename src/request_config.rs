//! Merged configuration for one request type

use crate::error_handler::ErrorHandler;
use crate::filter::RequestFilter;
use crate::key::Key;
use crate::profile::Options;
use crate::request::CrudRequest;
use crate::selector::Selector;
use crate::sorter::RequestSorter;
use futures::future::BoxFuture;
use hook_system::{ActionType, EntityHook, ItemHook, PostAction, PreAction, RequestHook, ResultHook};
use std::collections::HashMap;
use std::sync::Arc;

pub type EntityCreator<I, E> = Arc<dyn Fn(I) -> BoxFuture<'static, anyhow::Result<E>> + Send + Sync>;

pub type EntityUpdater<I, E> =
    Arc<dyn Fn(I, E) -> BoxFuture<'static, anyhow::Result<E>> + Send + Sync>;

pub type ResultCreator<E, O> = Arc<dyn Fn(&E) -> anyhow::Result<O> + Send + Sync>;

type EntityOf<R> = <R as CrudRequest>::Entity;
type ItemOf<R> = <R as CrudRequest>::Item;
type OutputOf<R> = <R as CrudRequest>::Output;

/// Everything the pipeline consults for request type `R`
///
/// Built once from the registered profiles and read-only afterwards. Lists hold
/// the contributions of every profile in merge order; scalars hold the value
/// of the last profile that set them.
pub struct RequestConfig<R: CrudRequest> {
    pub(crate) entity_key: Key<EntityOf<R>>,
    pub(crate) request_key: Option<Key<R>>,
    pub(crate) item_key: Option<Key<ItemOf<R>>>,
    pub(crate) selector: Option<Selector>,
    pub(crate) filters: Vec<Arc<dyn RequestFilter<R>>>,
    pub(crate) sorter: Option<Arc<dyn RequestSorter<R>>>,
    pub(crate) request_hooks: Vec<Arc<dyn RequestHook<R>>>,
    pub(crate) entity_hooks: Vec<Arc<dyn EntityHook<R, EntityOf<R>>>>,
    pub(crate) item_hooks: Vec<Arc<dyn ItemHook<R, ItemOf<R>>>>,
    pub(crate) result_hooks: Vec<Arc<dyn ResultHook<R, OutputOf<R>>>>,
    pub(crate) creator: Option<EntityCreator<ItemOf<R>, EntityOf<R>>>,
    pub(crate) updater: Option<EntityUpdater<ItemOf<R>, EntityOf<R>>>,
    pub(crate) default_value: Option<EntityOf<R>>,
    pub(crate) result_creator: Option<ResultCreator<EntityOf<R>, OutputOf<R>>>,
    pub(crate) pre_actions: HashMap<ActionType, Vec<PreAction<R>>>,
    pub(crate) post_actions: HashMap<ActionType, Vec<PostAction<EntityOf<R>>>>,
    pub(crate) error_handler: Option<Arc<dyn ErrorHandler>>,
    pub(crate) options: Options,
}

impl<R: CrudRequest> RequestConfig<R> {
    pub(crate) fn empty() -> Self {
        Self {
            entity_key: Key::primary(),
            request_key: None,
            item_key: None,
            selector: None,
            filters: Vec::new(),
            sorter: None,
            request_hooks: Vec::new(),
            entity_hooks: Vec::new(),
            item_hooks: Vec::new(),
            result_hooks: Vec::new(),
            creator: None,
            updater: None,
            default_value: None,
            result_creator: None,
            pre_actions: HashMap::new(),
            post_actions: HashMap::new(),
            error_handler: None,
            options: Options::default(),
        }
    }

    pub fn entity_key(&self) -> &Key<EntityOf<R>> {
        &self.entity_key
    }

    pub fn request_key(&self) -> Option<&Key<R>> {
        self.request_key.as_ref()
    }

    pub fn item_key(&self) -> Option<&Key<ItemOf<R>>> {
        self.item_key.as_ref()
    }

    pub fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }

    pub fn filters(&self) -> &[Arc<dyn RequestFilter<R>>] {
        &self.filters
    }

    pub fn has_sorter(&self) -> bool {
        self.sorter.is_some()
    }

    pub fn request_hooks(&self) -> &[Arc<dyn RequestHook<R>>] {
        &self.request_hooks
    }

    pub fn entity_hooks(&self) -> &[Arc<dyn EntityHook<R, EntityOf<R>>>] {
        &self.entity_hooks
    }

    pub fn item_hooks(&self) -> &[Arc<dyn ItemHook<R, ItemOf<R>>>] {
        &self.item_hooks
    }

    pub fn result_hooks(&self) -> &[Arc<dyn ResultHook<R, OutputOf<R>>>] {
        &self.result_hooks
    }

    pub fn default_value(&self) -> Option<&EntityOf<R>> {
        self.default_value.as_ref()
    }

    pub fn pre_actions(&self, action: ActionType) -> &[PreAction<R>] {
        self.pre_actions.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn post_actions(&self, action: ActionType) -> &[PostAction<EntityOf<R>>] {
        self.post_actions.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Whether entities can be found for a single request
    pub(crate) fn can_select_single(&self) -> bool {
        self.selector.is_some()
            || (self.entity_key.field().is_some()
                && (self.request_key.is_some() || self.item_key.is_some()))
    }

    /// Whether items can be correlated with entities
    pub(crate) fn can_join(&self) -> bool {
        self.item_key.is_some()
    }
}

impl<R: CrudRequest> std::fmt::Debug for RequestConfig<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestConfig")
            .field("request", &std::any::type_name::<R>())
            .field("entity_key", &self.entity_key)
            .field("selector", &self.selector)
            .field("filters", &self.filters.len())
            .field("has_sorter", &self.sorter.is_some())
            .field("request_hooks", &self.request_hooks.len())
            .field("entity_hooks", &self.entity_hooks.len())
            .field("item_hooks", &self.item_hooks.len())
            .field("result_hooks", &self.result_hooks.len())
            .field("options", &self.options)
            .finish()
    }
}
