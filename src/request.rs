//! Request contracts
//!
//! A request names its entity, the items it carries and the result it produces.
//! Requests without items use `()` as item type, requests without a result use
//! `()` as output type.

use hook_system::Lineage;
use serde::{de::DeserializeOwned, Serialize};
use store_object::Entity;

/// The handler a request is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestShape {
    Create,
    CreateAll,
    Get,
    GetAll,
    PagedGetAll,
    Update,
    UpdateAll,
    Delete,
    DeleteAll,
    Save,
    Merge,
    Synchronize,
}

impl RequestShape {
    /// Shapes that correlate request items with stored entities by key
    pub fn joins_items(&self) -> bool {
        matches!(
            self,
            RequestShape::UpdateAll | RequestShape::Merge | RequestShape::Synchronize
        )
    }

    pub fn is_bulk(&self) -> bool {
        matches!(
            self,
            RequestShape::CreateAll
                | RequestShape::UpdateAll
                | RequestShape::DeleteAll
                | RequestShape::Merge
                | RequestShape::Synchronize
        )
    }
}

pub trait CrudRequest: Lineage + Serialize + Send + Sync {
    const SHAPE: RequestShape;

    type Entity: Entity + Lineage;
    type Item: Clone + Send + Sync + Serialize + 'static;
    type Output: DeserializeOwned + Send + Sync + 'static;
}

/// A request carrying one item
pub trait ItemRequest: CrudRequest {
    fn item(&self) -> Self::Item;
}

/// A request carrying any number of items
pub trait ItemsRequest: CrudRequest {
    fn items(&self) -> Vec<Self::Item>;
}

/// A request for one page of results; pages are numbered from 1
pub trait PagedRequest: CrudRequest {
    fn page_number(&self) -> u64;

    /// Zero returns every row on one page
    fn page_size(&self) -> u64;
}
