//! Lineage-ordered merge of profiles into a [`RequestConfig`]
//!
//! Request levels form the outer loop and entity levels the inner one, both
//! from most general to the concrete type. Scalars take the last value set,
//! lists and actions accumulate, options merge flag by flag.

use super::{Profile, ProfileRegistry};
use crate::errors::CrudError;
use crate::filter::{RequestFilter, UpcastFilter};
use crate::key::Key;
use crate::request::{CrudRequest, RequestShape};
use crate::request_config::{EntityCreator, EntityUpdater, RequestConfig, ResultCreator};
use crate::sorter::{RequestSorter, UpcastSorter};
use hook_system::{
    upcast_post_action, upcast_pre_action, walk, EntityHook, ItemHook, LineageVisitor,
    RequestHook, ResultHook, UpcastEntityHook, UpcastItemHook, UpcastRequestHook,
    UpcastResultHook,
};
use std::any::type_name;
use std::sync::Arc;

type EntityOf<R> = <R as CrudRequest>::Entity;
type ItemOf<R> = <R as CrudRequest>::Item;
type OutputOf<R> = <R as CrudRequest>::Output;

pub(super) fn merge<R: CrudRequest>(registry: &ProfileRegistry) -> Result<RequestConfig<R>, CrudError> {
    let mut levels = RequestLevels {
        registry,
        config: RequestConfig::empty(),
        error: None,
    };
    walk::<R, _>(&mut levels);

    if let Some(error) = levels.error {
        return Err(error);
    }
    validate(&levels.config)?;

    crate::debug_log!("Built configuration {:?}", levels.config);
    Ok(levels.config)
}

struct RequestLevels<'a, R: CrudRequest> {
    registry: &'a ProfileRegistry,
    config: RequestConfig<R>,
    error: Option<CrudError>,
}

impl<R: CrudRequest> LineageVisitor<R> for RequestLevels<'_, R> {
    fn visit<BR: ?Sized + Send + Sync + 'static>(
        &mut self,
        upcast: fn(&R) -> &BR,
        _upcast_mut: fn(&mut R) -> &mut BR,
    ) {
        let mut entities = EntityLevels {
            registry: self.registry,
            config: &mut self.config,
            error: &mut self.error,
            request: upcast,
        };
        walk::<EntityOf<R>, _>(&mut entities);
    }
}

struct EntityLevels<'a, R: CrudRequest, BR: ?Sized> {
    registry: &'a ProfileRegistry,
    config: &'a mut RequestConfig<R>,
    error: &'a mut Option<CrudError>,
    request: fn(&R) -> &BR,
}

impl<R, BR> LineageVisitor<EntityOf<R>> for EntityLevels<'_, R, BR>
where
    R: CrudRequest,
    BR: ?Sized + Send + Sync + 'static,
{
    fn visit<BE: ?Sized + Send + Sync + 'static>(
        &mut self,
        upcast: fn(&EntityOf<R>) -> &BE,
        upcast_mut: fn(&mut EntityOf<R>) -> &mut BE,
    ) {
        if self.error.is_some() {
            return;
        }
        let upcasts = Upcasts {
            request: self.request,
            entity: upcast,
            entity_mut: upcast_mut,
        };
        for profile in self.registry.profiles::<BR, BE>() {
            if let Err(error) = absorb(self.config, profile, &upcasts) {
                *self.error = Some(error);
                return;
            }
        }
    }
}

struct Upcasts<R: CrudRequest, BR: ?Sized, BE: ?Sized> {
    request: fn(&R) -> &BR,
    entity: fn(&EntityOf<R>) -> &BE,
    entity_mut: fn(&mut EntityOf<R>) -> &mut BE,
}

fn absorb<R, BR, BE>(
    config: &mut RequestConfig<R>,
    profile: &Profile<BR, BE>,
    upcasts: &Upcasts<R, BR, BE>,
) -> Result<(), CrudError>
where
    R: CrudRequest,
    BR: ?Sized + Send + Sync + 'static,
    BE: ?Sized + Send + Sync + 'static,
{
    crate::trace_log!(
        "Merging profile ({}, {}) into {}",
        type_name::<BR>(),
        type_name::<BE>(),
        type_name::<R>()
    );

    if let Some(key) = &profile.entity_key {
        config.entity_key = key.upcast(upcasts.entity);
    }
    if let Some(key) = &profile.request_key {
        config.request_key = Some(key.upcast(upcasts.request));
    }
    if let Some(key) = &profile.item_key {
        let key = key
            .downcast_ref::<Key<ItemOf<R>>>()
            .ok_or_else(|| mismatch::<BR, BE>("item key", type_name::<ItemOf<R>>()))?;
        config.item_key = Some(key.clone());
    }
    if let Some(selector) = &profile.selector {
        config.selector = Some(selector.clone());
    }

    for filter in &profile.filters {
        let filter: Arc<dyn RequestFilter<R>> =
            Arc::new(UpcastFilter::new(Arc::clone(filter), upcasts.request));
        config.filters.push(filter);
    }
    if let Some(sorter) = &profile.sorter {
        let sorter: Arc<dyn RequestSorter<R>> =
            Arc::new(UpcastSorter::new(Arc::clone(sorter), upcasts.request));
        config.sorter = Some(sorter);
    }

    for hook in &profile.request_hooks {
        let hook: Arc<dyn RequestHook<R>> =
            Arc::new(UpcastRequestHook::new(Arc::clone(hook), upcasts.request));
        config.request_hooks.push(hook);
    }
    for hook in &profile.entity_hooks {
        let hook: Arc<dyn EntityHook<R, EntityOf<R>>> = Arc::new(UpcastEntityHook::new(
            Arc::clone(hook),
            upcasts.request,
            upcasts.entity_mut,
        ));
        config.entity_hooks.push(hook);
    }
    for hook in &profile.item_hooks {
        let inner = hook
            .downcast_ref::<Arc<dyn ItemHook<BR, ItemOf<R>>>>()
            .ok_or_else(|| mismatch::<BR, BE>("item hook", type_name::<ItemOf<R>>()))?;
        let hook: Arc<dyn ItemHook<R, ItemOf<R>>> =
            Arc::new(UpcastItemHook::new(Arc::clone(inner), upcasts.request));
        config.item_hooks.push(hook);
    }
    for hook in &profile.result_hooks {
        let inner = hook
            .downcast_ref::<Arc<dyn ResultHook<BR, OutputOf<R>>>>()
            .ok_or_else(|| mismatch::<BR, BE>("result hook", type_name::<OutputOf<R>>()))?;
        let hook: Arc<dyn ResultHook<R, OutputOf<R>>> =
            Arc::new(UpcastResultHook::new(Arc::clone(inner), upcasts.request));
        config.result_hooks.push(hook);
    }

    if let Some(creator) = &profile.creator {
        let creator = creator
            .downcast_ref::<EntityCreator<ItemOf<R>, EntityOf<R>>>()
            .ok_or_else(|| mismatch::<BR, BE>("creator", type_name::<ItemOf<R>>()))?;
        config.creator = Some(Arc::clone(creator));
    }
    if let Some(updater) = &profile.updater {
        let updater = updater
            .downcast_ref::<EntityUpdater<ItemOf<R>, EntityOf<R>>>()
            .ok_or_else(|| mismatch::<BR, BE>("updater", type_name::<ItemOf<R>>()))?;
        config.updater = Some(Arc::clone(updater));
    }
    if let Some(value) = &profile.default_value {
        let value = value
            .downcast_ref::<EntityOf<R>>()
            .ok_or_else(|| mismatch::<BR, BE>("default value", type_name::<EntityOf<R>>()))?;
        config.default_value = Some(value.clone());
    }
    if let Some(creator) = &profile.result_creator {
        let creator = creator
            .downcast_ref::<ResultCreator<EntityOf<R>, OutputOf<R>>>()
            .ok_or_else(|| mismatch::<BR, BE>("result creator", type_name::<OutputOf<R>>()))?;
        config.result_creator = Some(Arc::clone(creator));
    }

    for (action, pre) in &profile.pre_actions {
        config
            .pre_actions
            .entry(*action)
            .or_default()
            .push(upcast_pre_action(Arc::clone(pre), upcasts.request));
    }
    for (action, post) in &profile.post_actions {
        config
            .post_actions
            .entry(*action)
            .or_default()
            .push(upcast_post_action(Arc::clone(post), upcasts.entity_mut));
    }

    if let Some(handler) = &profile.error_handler {
        config.error_handler = Some(Arc::clone(handler));
    }
    config.options.merge(&profile.options);
    Ok(())
}

fn mismatch<BR: ?Sized, BE: ?Sized>(slot: &str, expected: &str) -> CrudError {
    CrudError::bad_configuration(format!(
        "{} of profile ({}, {}) does not fit {}",
        slot,
        type_name::<BR>(),
        type_name::<BE>(),
        expected
    ))
}

/// Reject configurations the request's handler could never execute
fn validate<R: CrudRequest>(config: &RequestConfig<R>) -> Result<(), CrudError> {
    let keyed_entity = config.entity_key.field().is_some();
    let missing = match R::SHAPE {
        RequestShape::Get | RequestShape::Delete => {
            config.selector.is_none() && !(keyed_entity && config.request_key.is_some())
        }
        RequestShape::Update | RequestShape::Save => !config.can_select_single(),
        RequestShape::UpdateAll | RequestShape::Synchronize => {
            !config.can_join() || (config.selector.is_none() && !keyed_entity)
        }
        RequestShape::Merge => !config.can_join(),
        RequestShape::Create
        | RequestShape::CreateAll
        | RequestShape::GetAll
        | RequestShape::PagedGetAll
        | RequestShape::DeleteAll => false,
    };

    if missing {
        return Err(CrudError::bad_configuration(format!(
            "{} ({:?}) has no way to select {}",
            type_name::<R>(),
            R::SHAPE,
            type_name::<EntityOf<R>>()
        )));
    }
    Ok(())
}
