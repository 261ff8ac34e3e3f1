//! Request-bound entity selection
//!
//! A [`Selector`] is bound once to a request type and later asked to select for
//! a concrete request. The concrete type must be the bound type or list it in
//! its [`Lineage`]; anything else is a [`CrudError::RequestTypeMismatch`].

use crate::errors::CrudError;
use hook_system::{walk, Lineage, LineageVisitor};
use std::any::{type_name, Any, TypeId};
use std::sync::Arc;
use store_object::QueryFilter;

type SelectFn<B> = Arc<dyn Fn(&B) -> QueryFilter + Send + Sync>;

#[derive(Clone)]
pub struct Selector {
    request_type: TypeId,
    request_name: &'static str,
    select: Arc<dyn Any + Send + Sync>,
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("request_type", &self.request_name)
            .finish()
    }
}

impl Selector {
    pub fn bind<B, F>(select: F) -> Self
    where
        B: ?Sized + 'static,
        F: Fn(&B) -> QueryFilter + Send + Sync + 'static,
    {
        let select: SelectFn<B> = Arc::new(select);
        Self {
            request_type: TypeId::of::<B>(),
            request_name: type_name::<B>(),
            select: Arc::new(select),
        }
    }

    pub fn request_type(&self) -> &'static str {
        self.request_name
    }

    /// Entity predicate for `request`
    pub fn select<D>(&self, request: &D) -> Result<QueryFilter, CrudError>
    where
        D: Lineage + Send + Sync,
    {
        let mut visitor = SelectVisitor {
            selector: self,
            request,
            selected: None,
        };
        walk::<D, _>(&mut visitor);

        visitor.selected.ok_or(CrudError::RequestTypeMismatch {
            actual: type_name::<D>(),
            expected: self.request_name,
        })
    }
}

struct SelectVisitor<'a, D> {
    selector: &'a Selector,
    request: &'a D,
    selected: Option<QueryFilter>,
}

impl<D> LineageVisitor<D> for SelectVisitor<'_, D> {
    fn visit<B: ?Sized + Send + Sync + 'static>(
        &mut self,
        upcast: fn(&D) -> &B,
        _upcast_mut: fn(&mut D) -> &mut B,
    ) {
        if self.selected.is_some() || TypeId::of::<B>() != self.selector.request_type {
            return;
        }
        if let Some(select) = self.selector.select.downcast_ref::<SelectFn<B>>() {
            self.selected = Some(select(upcast(self.request)));
        }
    }
}
