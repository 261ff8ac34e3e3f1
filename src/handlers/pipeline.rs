//! Stages shared by every handler
//!
//! A [`Pipeline`] borrows everything one request needs. Each stage checks for
//! cancellation after its awaits and reports failures already classified.

use crate::error_handler::{DefaultErrorHandler, ErrorHandler};
use crate::errors::CrudError;
use crate::filter::apply_filters;
use crate::key::Key;
use crate::request::CrudRequest;
use crate::request_config::RequestConfig;
use crate::response::{Response, ResponseError};
use config::PipelineConfig;
use hook_system::{is_cancellation, ActionType, ChangeEvent, HookError, RequestContext, SignalManager};
use object_mapping::{map_to, map_value_to, MapTarget, ObjectMapper};
use serde::Serialize;
use serde_json::Value;
use std::any::{type_name, Any};
use store_object::{DataContext, Entity, EntitySet, QueryBuilder, QueryFilter};

pub(crate) type EntityOf<R> = <R as CrudRequest>::Entity;
pub(crate) type ItemOf<R> = <R as CrudRequest>::Item;
pub(crate) type OutputOf<R> = <R as CrudRequest>::Output;

pub(crate) struct Pipeline<'a, R: CrudRequest> {
    pub(crate) request: &'a R,
    pub(crate) config: &'a RequestConfig<R>,
    pub(crate) data: &'a dyn DataContext,
    pub(crate) ctx: &'a RequestContext,
    pub(crate) mapper: &'a dyn ObjectMapper,
    pub(crate) signals: Option<&'a SignalManager>,
    pub(crate) settings: PipelineConfig,
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// `Some(())` when `O` is the unit type
fn unit_output<O: 'static>() -> Option<O> {
    let mut slot = Some(());
    (&mut slot as &mut dyn Any)
        .downcast_mut::<Option<O>>()
        .and_then(Option::take)
}

pub(crate) fn entity_keys<E: Entity>(entities: &[E]) -> Vec<Value> {
    entities
        .iter()
        .map(|entity| entity.key_value().to_json())
        .collect()
}

impl<'a, R: CrudRequest> Pipeline<'a, R> {
    pub(crate) fn entities(&self) -> EntitySet<'a, EntityOf<R>> {
        EntitySet::new(self.data)
    }

    pub(crate) fn checkpoint(&self) -> Result<(), CrudError> {
        self.ctx.check_canceled()?;
        Ok(())
    }

    /// Classify an error raised by a filter, sorter or other untyped stage
    pub(crate) fn failed(&self, cause: anyhow::Error) -> CrudError {
        if is_cancellation(&cause) {
            CrudError::RequestCanceled
        } else {
            CrudError::request_failed(to_json(self.request), format!("{:#}", cause))
        }
    }

    pub(crate) fn not_found(&self) -> CrudError {
        CrudError::FailedToFind {
            entity: type_name::<EntityOf<R>>(),
            request: to_json(self.request),
        }
    }

    /// Outcome of a lookup that matched nothing
    pub(crate) fn missing<T>(&self) -> Result<Response<T>, CrudError> {
        if self.settings.failed_to_find_is_error {
            Err(self.not_found())
        } else {
            Ok(Response::empty())
        }
    }

    // Hooks and actions

    pub(crate) async fn run_request_hooks(&self) -> Result<(), CrudError> {
        for hook in &self.config.request_hooks {
            hook.run(self.request, self.ctx)
                .await
                .map_err(|e| HookError::from_hook(hook.name(), e))?;
            self.checkpoint()?;
        }
        Ok(())
    }

    pub(crate) async fn run_item_hooks(&self, mut item: ItemOf<R>) -> Result<ItemOf<R>, CrudError> {
        for hook in &self.config.item_hooks {
            item = hook
                .run(self.request, item, self.ctx)
                .await
                .map_err(|e| HookError::from_hook(hook.name(), e))?;
            self.checkpoint()?;
        }
        Ok(item)
    }

    pub(crate) async fn run_entity_hooks(&self, entity: &mut EntityOf<R>) -> Result<(), CrudError> {
        for hook in &self.config.entity_hooks {
            hook.run(self.request, entity, self.ctx)
                .await
                .map_err(|e| HookError::from_hook(hook.name(), e))?;
            self.checkpoint()?;
        }
        Ok(())
    }

    pub(crate) async fn run_result_hooks(
        &self,
        mut result: OutputOf<R>,
    ) -> Result<OutputOf<R>, CrudError> {
        for hook in &self.config.result_hooks {
            result = hook
                .run(self.request, result, self.ctx)
                .await
                .map_err(|e| HookError::from_hook(hook.name(), e))?;
            self.checkpoint()?;
        }
        Ok(result)
    }

    pub(crate) fn run_pre_actions(&self, action: ActionType) -> Result<(), CrudError> {
        for pre in self.config.pre_actions(action) {
            pre(self.request)
                .map_err(|e| HookError::from_hook(&format!("pre {} action", action), e))?;
        }
        Ok(())
    }

    pub(crate) fn run_post_actions(
        &self,
        action: ActionType,
        entity: &mut EntityOf<R>,
    ) -> Result<(), CrudError> {
        for post in self.config.post_actions(action) {
            post(entity).map_err(|e| HookError::from_hook(&format!("post {} action", action), e))?;
        }
        Ok(())
    }

    // Entities and results

    pub(crate) async fn create_entity(&self, item: ItemOf<R>) -> Result<EntityOf<R>, CrudError> {
        let created = match &self.config.creator {
            Some(creator) => creator(item.clone()).await,
            None => map_to::<ItemOf<R>, EntityOf<R>>(self.mapper, &item).map_err(anyhow::Error::from),
        };
        self.checkpoint()?;

        created.map_err(|cause| {
            if is_cancellation(&cause) {
                CrudError::RequestCanceled
            } else {
                CrudError::CreateEntityFailed {
                    item: to_json(&item),
                    cause,
                }
            }
        })
    }

    pub(crate) async fn update_entity(
        &self,
        item: ItemOf<R>,
        entity: EntityOf<R>,
    ) -> Result<EntityOf<R>, CrudError> {
        let item_row = to_json(&item);
        let entity_row = to_json(&entity);
        let updated = match &self.config.updater {
            Some(updater) => updater(item, entity).await,
            None => self.overlay(item_row.clone(), entity_row.clone()),
        };
        self.checkpoint()?;

        updated.map_err(|cause| {
            if is_cancellation(&cause) {
                CrudError::RequestCanceled
            } else {
                CrudError::UpdateEntityFailed {
                    item: item_row,
                    entity: entity_row,
                    cause,
                }
            }
        })
    }

    /// Copy the mapped item's fields onto the entity, keeping its primary key
    fn overlay(&self, item: Value, entity: Value) -> anyhow::Result<EntityOf<R>> {
        let changes = self
            .mapper
            .map(item, &MapTarget::of::<ItemOf<R>, EntityOf<R>>())?;
        let primary_key = <EntityOf<R> as Entity>::primary_key_field();

        let mut row = entity;
        if let (Value::Object(fields), Value::Object(changes)) = (&mut row, changes) {
            for (field, value) in changes {
                if field != primary_key {
                    fields.insert(field, value);
                }
            }
        }
        Ok(serde_json::from_value(row)?)
    }

    fn result_failed(&self, entity: Value, cause: anyhow::Error) -> CrudError {
        if is_cancellation(&cause) {
            CrudError::RequestCanceled
        } else {
            CrudError::CreateResultFailed { entity, cause }
        }
    }

    pub(crate) fn create_result(&self, entity: &EntityOf<R>) -> Result<OutputOf<R>, CrudError> {
        let result = match &self.config.result_creator {
            Some(create) => create(entity),
            None => match unit_output::<OutputOf<R>>() {
                Some(unit) => Ok(unit),
                None => map_to::<EntityOf<R>, OutputOf<R>>(self.mapper, entity)
                    .map_err(anyhow::Error::from),
            },
        };
        result.map_err(|cause| self.result_failed(to_json(entity), cause))
    }

    pub(crate) async fn result(&self, entity: &EntityOf<R>) -> Result<OutputOf<R>, CrudError> {
        let result = self.create_result(entity)?;
        self.run_result_hooks(result).await
    }

    pub(crate) async fn results(&self, entities: &[EntityOf<R>]) -> Result<Vec<OutputOf<R>>, CrudError> {
        let mut results = Vec::with_capacity(entities.len());
        for entity in entities {
            results.push(self.result(entity).await?);
        }
        Ok(results)
    }

    /// Entity fields the result is built from, when the query can be projected
    pub(crate) fn projection(&self) -> Option<Vec<String>> {
        if !self.settings.use_projection || self.config.result_creator.is_some() {
            return None;
        }
        self.mapper
            .projection(&MapTarget::of::<EntityOf<R>, OutputOf<R>>())
    }

    /// Results for every row `query` returns
    pub(crate) async fn load_results(&self, query: QueryBuilder) -> Result<Vec<OutputOf<R>>, CrudError> {
        let Some(fields) = self.projection() else {
            let entities = self.list(&query).await?;
            return self.results(&entities).await;
        };

        crate::trace_log!("Projecting {} onto {:?}", type_name::<EntityOf<R>>(), fields);
        let rows = self.entities().rows(&query.select(fields)).await?;
        self.checkpoint()?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let result = map_value_to::<EntityOf<R>, OutputOf<R>>(self.mapper, row.clone())
                .map_err(|e| self.result_failed(row, e.into()))?;
            results.push(self.run_result_hooks(result).await?);
        }
        Ok(results)
    }

    // Selection

    /// Query narrowed by the selector, if one is configured
    pub(crate) fn selected(&self) -> Result<QueryBuilder, CrudError> {
        let query = QueryBuilder::new();
        Ok(match &self.config.selector {
            Some(selector) => query.filter(selector.select(self.request)?),
            None => query,
        })
    }

    /// Query for the one entity the request targets
    pub(crate) fn select_single(&self, item: Option<&ItemOf<R>>) -> Result<QueryBuilder, CrudError> {
        if self.config.selector.is_some() {
            return self.selected();
        }

        let field = self.config.entity_key.field();
        let key = match (&self.config.request_key, &self.config.item_key, item) {
            (Some(key), _, _) => Some(key.get(self.request)),
            (None, Some(key), Some(item)) => Some(key.get(item)),
            _ => None,
        };
        match (field, key) {
            (Some(field), Some(key)) => {
                Ok(QueryBuilder::new().filter(QueryFilter::eq(field, key.to_json())))
            }
            _ => Err(CrudError::bad_configuration(format!(
                "{} cannot select a single {}",
                type_name::<R>(),
                type_name::<EntityOf<R>>()
            ))),
        }
    }

    /// Query for the entities whose keys appear among `items`
    pub(crate) fn select_items(&self, items: &[ItemOf<R>]) -> Result<QueryBuilder, CrudError> {
        if self.config.selector.is_some() {
            return self.selected();
        }

        let (Some(field), Some(item_key)) = (self.config.entity_key.field(), &self.config.item_key)
        else {
            return Err(CrudError::bad_configuration(format!(
                "{} cannot correlate items with {}",
                type_name::<R>(),
                type_name::<EntityOf<R>>()
            )));
        };
        let keys = items
            .iter()
            .map(|item| item_key.get(item))
            .filter(|key| !key.is_null())
            .map(|key| key.to_json())
            .collect();
        Ok(QueryBuilder::new().filter(QueryFilter::in_values(field, keys)))
    }

    pub(crate) fn item_key(&self) -> Result<&'a Key<ItemOf<R>>, CrudError> {
        self.config.item_key.as_ref().ok_or_else(|| {
            CrudError::bad_configuration(format!("{} has no item key", type_name::<R>()))
        })
    }

    pub(crate) fn filtered(&self, query: QueryBuilder) -> Result<QueryBuilder, CrudError> {
        let query = apply_filters(&self.config.filters, self.request, query, self.ctx)
            .map_err(|e| self.failed(e))?;
        self.checkpoint()?;
        Ok(query)
    }

    /// Apply the sorter; a sorter that declines keeps the query as it was
    pub(crate) fn sorted(&self, query: QueryBuilder) -> Result<QueryBuilder, CrudError> {
        let Some(sorter) = &self.config.sorter else {
            return Ok(query);
        };
        let sorted = sorter
            .sort(self.request, query.clone(), self.ctx)
            .map_err(|e| self.failed(e))?;
        Ok(sorted.unwrap_or(query))
    }

    // Storage

    pub(crate) async fn find(&self, query: &QueryBuilder) -> Result<Option<EntityOf<R>>, CrudError> {
        let found = self.entities().first(query).await?;
        self.checkpoint()?;
        Ok(found)
    }

    pub(crate) async fn list(&self, query: &QueryBuilder) -> Result<Vec<EntityOf<R>>, CrudError> {
        let entities = self.entities().list(query).await?;
        self.checkpoint()?;
        Ok(entities)
    }

    /// Build, hook and stage a new entity from an item whose hooks already ran
    pub(crate) async fn stage_create(&self, item: ItemOf<R>) -> Result<EntityOf<R>, CrudError> {
        let mut entity = self.create_entity(item).await?;
        self.run_entity_hooks(&mut entity).await?;

        self.checkpoint()?;
        let mut stored = self.entities().create(&entity).await?;
        self.checkpoint()?;

        self.run_post_actions(ActionType::Create, &mut stored)?;
        Ok(stored)
    }

    pub(crate) async fn stage_update(
        &self,
        item: ItemOf<R>,
        entity: EntityOf<R>,
    ) -> Result<EntityOf<R>, CrudError> {
        let mut entity = self.update_entity(item, entity).await?;
        self.run_entity_hooks(&mut entity).await?;

        self.checkpoint()?;
        let mut stored = self.entities().update(&entity).await?;
        self.checkpoint()?;

        self.run_post_actions(ActionType::Update, &mut stored)?;
        Ok(stored)
    }

    pub(crate) async fn stage_delete(&self, mut entity: EntityOf<R>) -> Result<EntityOf<R>, CrudError> {
        self.run_entity_hooks(&mut entity).await?;

        self.checkpoint()?;
        self.entities().delete(&entity).await?;
        self.checkpoint()?;

        self.run_post_actions(ActionType::Delete, &mut entity)?;
        Ok(entity)
    }

    /// Last cancellation point; staged writes become visible
    pub(crate) async fn commit(&self) -> Result<u64, CrudError> {
        self.checkpoint()?;
        let affected = self.data.apply_changes().await?;
        crate::debug_log!("Committed {} change(s) for {}", affected, type_name::<R>());
        Ok(affected)
    }

    pub(crate) async fn emit(&self, action: ActionType, keys: Vec<Value>) {
        if !self.settings.emit_signals || keys.is_empty() {
            return;
        }
        let Some(signals) = self.signals else {
            return;
        };
        let event = ChangeEvent::new(
            action,
            <EntityOf<R> as Entity>::table_name(),
            self.ctx.request_id(),
        )
        .with_keys(keys);
        signals.emit(event).await;
    }

    // Boundary

    /// Turn a failed outcome into a response through the configured error handler
    ///
    /// Staged changes are discarded first so a failed request writes nothing.
    pub(crate) async fn finish<T>(
        &self,
        outcome: Result<Response<T>, CrudError>,
    ) -> Result<Response<T>, CrudError> {
        let error = match outcome {
            Ok(response) => {
                tracing::debug!(
                    request = type_name::<R>(),
                    request_id = %self.ctx.request_id(),
                    "request handled"
                );
                return Ok(response);
            }
            Err(error) => error,
        };

        if let Err(discard) = self.data.discard_changes().await {
            tracing::warn!(
                request = type_name::<R>(),
                "failed to discard staged changes: {}",
                discard
            );
        }

        let fallback = ResponseError::from(&error);
        let handled = match &self.config.error_handler {
            Some(handler) => handler.handle(error),
            None => DefaultErrorHandler.handle(error),
        };
        match handled {
            Ok(mut errors) => {
                if errors.is_empty() {
                    errors.push(fallback);
                }
                tracing::warn!(
                    request = type_name::<R>(),
                    request_id = %self.ctx.request_id(),
                    kind = ?errors.first().map(|e| e.kind),
                    "request failed: {}",
                    errors.first().map(|e| e.message.as_str()).unwrap_or_default()
                );
                Ok(Response::failure(errors))
            }
            Err(error) => {
                tracing::error!(
                    request = type_name::<R>(),
                    request_id = %self.ctx.request_id(),
                    "request failed: {}",
                    error
                );
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_output() {
        assert_eq!(unit_output::<()>(), Some(()));
        assert_eq!(unit_output::<String>(), None);
    }
}
