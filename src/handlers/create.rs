use super::pipeline::{entity_keys, OutputOf, Pipeline};
use crate::errors::CrudError;
use crate::request::{ItemRequest, ItemsRequest};
use crate::response::Response;
use hook_system::ActionType;

pub(crate) async fn create<R: ItemRequest>(
    p: &Pipeline<'_, R>,
) -> Result<Response<OutputOf<R>>, CrudError> {
    p.checkpoint()?;
    p.run_request_hooks().await?;
    p.run_pre_actions(ActionType::Create)?;

    let item = p.run_item_hooks(p.request.item()).await?;
    let entity = p.stage_create(item).await?;
    let result = p.result(&entity).await?;

    p.commit().await?;
    p.emit(ActionType::Create, entity_keys(std::slice::from_ref(&entity)))
        .await;
    Ok(Response::success(result))
}

pub(crate) async fn create_all<R: ItemsRequest>(
    p: &Pipeline<'_, R>,
) -> Result<Response<Vec<OutputOf<R>>>, CrudError> {
    p.checkpoint()?;
    p.run_request_hooks().await?;
    p.run_pre_actions(ActionType::Create)?;

    let mut items = Vec::new();
    for item in p.request.items() {
        items.push(p.run_item_hooks(item).await?);
    }

    let mut created = Vec::with_capacity(items.len());
    for item in items {
        created.push(p.stage_create(item).await?);
    }
    let results = p.results(&created).await?;

    p.commit().await?;
    p.emit(ActionType::Create, entity_keys(&created)).await;
    Ok(Response::success(results))
}
