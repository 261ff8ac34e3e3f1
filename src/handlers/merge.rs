use super::pipeline::{entity_keys, OutputOf, Pipeline};
use crate::errors::CrudError;
use crate::join::full_outer_join;
use crate::request::ItemsRequest;
use crate::response::Response;
use hook_system::ActionType;

/// Create unmatched items, update matched pairs, delete unmatched entities
pub(crate) async fn merge<R: ItemsRequest>(
    p: &Pipeline<'_, R>,
) -> Result<Response<Vec<OutputOf<R>>>, CrudError> {
    reconcile(p, true).await
}

/// Create unmatched items and update matched pairs
pub(crate) async fn synchronize<R: ItemsRequest>(
    p: &Pipeline<'_, R>,
) -> Result<Response<Vec<OutputOf<R>>>, CrudError> {
    reconcile(p, false).await
}

async fn reconcile<R: ItemsRequest>(
    p: &Pipeline<'_, R>,
    delete_unmatched: bool,
) -> Result<Response<Vec<OutputOf<R>>>, CrudError> {
    p.checkpoint()?;
    p.run_request_hooks().await?;
    p.run_pre_actions(ActionType::Save)?;

    let mut items = Vec::new();
    for item in p.request.items() {
        items.push(p.run_item_hooks(item).await?);
    }

    // Deleting needs every candidate entity, not only those with a matching item
    let query = if delete_unmatched {
        p.selected()?
    } else {
        p.select_items(&items)?
    };
    let entities = p.list(&p.filtered(query)?).await?;
    let item_key = p.item_key()?;
    let entity_key = &p.config.entity_key;

    let mut created = Vec::new();
    let mut updated = Vec::new();
    let mut deleted = Vec::new();
    let mut saved = Vec::new();
    for pair in full_outer_join(items, entities, |i| item_key.get(i), |e| entity_key.get(e)) {
        match pair {
            (Some(item), Some(entity)) => {
                let entity = p.stage_update(item, entity).await?;
                updated.push(entity.clone());
                saved.push(entity);
            }
            (Some(item), None) => {
                let entity = p.stage_create(item).await?;
                created.push(entity.clone());
                saved.push(entity);
            }
            (None, Some(entity)) if delete_unmatched => {
                deleted.push(p.stage_delete(entity).await?);
            }
            (None, _) => {}
        }
    }
    crate::trace_log!(
        "Reconciled: {} created, {} updated, {} deleted",
        created.len(),
        updated.len(),
        deleted.len()
    );
    let results = p.results(&saved).await?;

    p.commit().await?;
    p.emit(ActionType::Create, entity_keys(&created)).await;
    p.emit(ActionType::Update, entity_keys(&updated)).await;
    p.emit(ActionType::Delete, entity_keys(&deleted)).await;
    Ok(Response::success(results))
}
