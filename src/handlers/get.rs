use super::pipeline::{OutputOf, Pipeline};
use crate::errors::CrudError;
use crate::request::{CrudRequest, PagedRequest};
use crate::response::{PagedResult, Response};

pub(crate) async fn get<R: CrudRequest>(
    p: &Pipeline<'_, R>,
) -> Result<Response<OutputOf<R>>, CrudError> {
    p.checkpoint()?;
    p.run_request_hooks().await?;

    let query = p.sorted(p.filtered(p.select_single(None)?)?)?;
    let mut results = p.load_results(query.take(1)).await?;
    if let Some(result) = results.pop() {
        return Ok(Response::success(result));
    }

    if p.settings.failed_to_find_is_error {
        return Err(p.not_found());
    }
    match &p.config.default_value {
        Some(default) => {
            crate::trace_log!("Nothing found, returning the default value");
            Ok(Response::success(p.result(default).await?))
        }
        None => Ok(Response::empty()),
    }
}

pub(crate) async fn get_all<R: CrudRequest>(
    p: &Pipeline<'_, R>,
) -> Result<Response<Vec<OutputOf<R>>>, CrudError> {
    p.checkpoint()?;
    p.run_request_hooks().await?;

    let query = p.sorted(p.filtered(p.selected()?)?)?;
    let results = p.load_results(query).await?;
    Ok(Response::success(results))
}

pub(crate) async fn paged_get_all<R: PagedRequest>(
    p: &Pipeline<'_, R>,
) -> Result<Response<PagedResult<OutputOf<R>>>, CrudError> {
    p.checkpoint()?;
    p.run_request_hooks().await?;

    let query = p.filtered(p.selected()?)?;
    let total = p.entities().count(&query).await?;
    p.checkpoint()?;

    let page_size = p.request.page_size();
    let page_number = if page_size == 0 {
        1
    } else {
        p.request.page_number().max(1)
    };

    let mut query = p.sorted(query)?;
    if page_size > 0 {
        let offset = page_number.saturating_sub(1).saturating_mul(page_size);
        query = query.skip(offset).take(page_size);
    }

    let items = p.load_results(query).await?;
    Ok(Response::success(PagedResult::new(
        items,
        page_number,
        page_size,
        total,
    )))
}
