use super::pipeline::{entity_keys, OutputOf, Pipeline};
use crate::errors::CrudError;
use crate::request::ItemRequest;
use crate::response::Response;
use hook_system::ActionType;

/// Update the matching entity, or create one when nothing matches
///
/// Pre actions run under [`ActionType::Save`]; post actions and the change
/// event use the action actually performed.
pub(crate) async fn save<R: ItemRequest>(
    p: &Pipeline<'_, R>,
) -> Result<Response<OutputOf<R>>, CrudError> {
    p.checkpoint()?;
    p.run_request_hooks().await?;
    p.run_pre_actions(ActionType::Save)?;

    let item = p.run_item_hooks(p.request.item()).await?;
    let query = p.filtered(p.select_single(Some(&item))?)?;
    let (action, saved) = match p.find(&query).await? {
        Some(entity) => (ActionType::Update, p.stage_update(item, entity).await?),
        None => (ActionType::Create, p.stage_create(item).await?),
    };
    let result = p.result(&saved).await?;

    p.commit().await?;
    p.emit(action, entity_keys(std::slice::from_ref(&saved))).await;
    Ok(Response::success(result))
}
