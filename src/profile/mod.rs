//! Profiles: declarative configuration for one (request, entity) pair
//!
//! A profile may name ancestor types on either side, including trait objects,
//! e.g. `Profile<dyn Audited, dyn Timestamped>`. When a request type's
//! configuration is built, every profile registered along the request's and
//! the entity's lineage is merged into one [`RequestConfig`](crate::RequestConfig).

mod builder;
mod merge;
mod options;
mod registry;

pub use options::Options;
pub use registry::ProfileRegistry;

use crate::error_handler::ErrorHandler;
use crate::filter::RequestFilter;
use crate::key::Key;
use crate::selector::Selector;
use crate::sorter::RequestSorter;
use hook_system::{ActionType, EntityHook, PostAction, PreAction, RequestHook};
use std::any::Any;
use std::sync::Arc;

/// Slot whose concrete type depends on the request's item or output type
pub(crate) type Erased = Arc<dyn Any + Send + Sync>;

pub struct Profile<R: ?Sized + Sync, E: ?Sized + Send> {
    pub(crate) entity_key: Option<Key<E>>,
    pub(crate) request_key: Option<Key<R>>,
    pub(crate) item_key: Option<Erased>,
    pub(crate) selector: Option<Selector>,
    pub(crate) filters: Vec<Arc<dyn RequestFilter<R>>>,
    pub(crate) sorter: Option<Arc<dyn RequestSorter<R>>>,
    pub(crate) request_hooks: Vec<Arc<dyn RequestHook<R>>>,
    pub(crate) entity_hooks: Vec<Arc<dyn EntityHook<R, E>>>,
    pub(crate) item_hooks: Vec<Erased>,
    pub(crate) result_hooks: Vec<Erased>,
    pub(crate) creator: Option<Erased>,
    pub(crate) updater: Option<Erased>,
    pub(crate) default_value: Option<Erased>,
    pub(crate) result_creator: Option<Erased>,
    pub(crate) pre_actions: Vec<(ActionType, PreAction<R>)>,
    pub(crate) post_actions: Vec<(ActionType, PostAction<E>)>,
    pub(crate) error_handler: Option<Arc<dyn ErrorHandler>>,
    pub(crate) options: Options,
}

impl<R: ?Sized + Sync, E: ?Sized + Send> Default for Profile<R, E> {
    fn default() -> Self {
        Self {
            entity_key: None,
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
            pre_actions: Vec::new(),
            post_actions: Vec::new(),
            error_handler: None,
            options: Options::default(),
        }
    }
}

impl<R: ?Sized + Sync, E: ?Sized + Send> std::fmt::Debug for Profile<R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("request", &std::any::type_name::<R>())
            .field("entity", &std::any::type_name::<E>())
            .field("filters", &self.filters.len())
            .field("request_hooks", &self.request_hooks.len())
            .field("entity_hooks", &self.entity_hooks.len())
            .field("item_hooks", &self.item_hooks.len())
            .field("result_hooks", &self.result_hooks.len())
            .finish()
    }
}
