use super::pipeline::{entity_keys, OutputOf, Pipeline};
use crate::errors::CrudError;
use crate::request::CrudRequest;
use crate::response::Response;
use hook_system::ActionType;

pub(crate) async fn delete<R: CrudRequest>(
    p: &Pipeline<'_, R>,
) -> Result<Response<OutputOf<R>>, CrudError> {
    p.checkpoint()?;
    p.run_request_hooks().await?;
    p.run_pre_actions(ActionType::Delete)?;

    let query = p.filtered(p.select_single(None)?)?;
    let Some(entity) = p.find(&query).await? else {
        return p.missing();
    };

    let deleted = p.stage_delete(entity).await?;
    let result = p.result(&deleted).await?;

    p.commit().await?;
    p.emit(ActionType::Delete, entity_keys(std::slice::from_ref(&deleted)))
        .await;
    Ok(Response::success(result))
}

/// Delete every entity the selector and filters leave
pub(crate) async fn delete_all<R: CrudRequest>(
    p: &Pipeline<'_, R>,
) -> Result<Response<Vec<OutputOf<R>>>, CrudError> {
    p.checkpoint()?;
    p.run_request_hooks().await?;
    p.run_pre_actions(ActionType::Delete)?;

    let query = p.filtered(p.selected()?)?;
    let mut deleted = Vec::new();
    for entity in p.list(&query).await? {
        deleted.push(p.stage_delete(entity).await?);
    }
    let results = p.results(&deleted).await?;

    p.commit().await?;
    p.emit(ActionType::Delete, entity_keys(&deleted)).await;
    Ok(Response::success(results))
}
