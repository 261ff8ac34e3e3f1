use super::pipeline::{entity_keys, OutputOf, Pipeline};
use crate::errors::CrudError;
use crate::join::full_outer_join;
use crate::request::{ItemRequest, ItemsRequest};
use crate::response::Response;
use hook_system::ActionType;

pub(crate) async fn update<R: ItemRequest>(
    p: &Pipeline<'_, R>,
) -> Result<Response<OutputOf<R>>, CrudError> {
    p.checkpoint()?;
    p.run_request_hooks().await?;
    p.run_pre_actions(ActionType::Update)?;

    let item = p.run_item_hooks(p.request.item()).await?;
    let query = p.filtered(p.select_single(Some(&item))?)?;
    let Some(entity) = p.find(&query).await? else {
        return p.missing();
    };

    let updated = p.stage_update(item, entity).await?;
    let result = p.result(&updated).await?;

    p.commit().await?;
    p.emit(ActionType::Update, entity_keys(std::slice::from_ref(&updated)))
        .await;
    Ok(Response::success(result))
}

/// Update every stored entity matched by an item; unmatched entities are left alone
pub(crate) async fn update_all<R: ItemsRequest>(
    p: &Pipeline<'_, R>,
) -> Result<Response<Vec<OutputOf<R>>>, CrudError> {
    p.checkpoint()?;
    p.run_request_hooks().await?;
    p.run_pre_actions(ActionType::Update)?;

    let mut items = Vec::new();
    for item in p.request.items() {
        items.push(p.run_item_hooks(item).await?);
    }

    let query = p.filtered(p.select_items(&items)?)?;
    let entities = p.list(&query).await?;
    let item_key = p.item_key()?;
    let entity_key = &p.config.entity_key;

    let mut updated = Vec::new();
    for pair in full_outer_join(items, entities, |i| item_key.get(i), |e| entity_key.get(e)) {
        match pair {
            (Some(item), Some(entity)) => updated.push(p.stage_update(item, entity).await?),
            (Some(_), None) if p.settings.failed_to_find_is_error => return Err(p.not_found()),
            _ => {}
        }
    }
    let results = p.results(&updated).await?;

    p.commit().await?;
    p.emit(ActionType::Update, entity_keys(&updated)).await;
    Ok(Response::success(results))
}
