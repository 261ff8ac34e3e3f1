//! Typed access to one entity table of a [`DataContext`]

use crate::errors::StoreError;
use crate::query_builder::QueryBuilder;
use crate::traits::{DataContext, Entity};
use serde_json::Value;
use std::marker::PhantomData;

pub struct EntitySet<'c, E: Entity> {
    context: &'c dyn DataContext,
    _phantom: PhantomData<fn() -> E>,
}

impl<'c, E: Entity> EntitySet<'c, E> {
    pub fn new(context: &'c dyn DataContext) -> Self {
        Self {
            context,
            _phantom: PhantomData,
        }
    }

    pub async fn list(&self, query: &QueryBuilder) -> Result<Vec<E>, StoreError> {
        let rows = self.context.fetch(&E::table_ref(), query).await?;
        rows.into_iter().map(decode::<E>).collect()
    }

    pub async fn first(&self, query: &QueryBuilder) -> Result<Option<E>, StoreError> {
        let query = query.clone().take(1);
        let mut rows = self.context.fetch(&E::table_ref(), &query).await?;
        match rows.pop() {
            Some(row) => decode::<E>(row).map(Some),
            None => Ok(None),
        }
    }

    /// Raw rows, for queries that project to fields the entity may not deserialize from
    pub async fn rows(&self, query: &QueryBuilder) -> Result<Vec<Value>, StoreError> {
        self.context.fetch(&E::table_ref(), query).await
    }

    pub async fn count(&self, query: &QueryBuilder) -> Result<u64, StoreError> {
        self.context.count(&E::table_ref(), query).await
    }

    pub async fn create(&self, entity: &E) -> Result<E, StoreError> {
        let row = self.context.insert(&E::table_ref(), encode(entity)?).await?;
        decode(row)
    }

    pub async fn update(&self, entity: &E) -> Result<E, StoreError> {
        let row = self.context.update(&E::table_ref(), encode(entity)?).await?;
        decode(row)
    }

    pub async fn delete(&self, entity: &E) -> Result<bool, StoreError> {
        self.context
            .delete(&E::table_ref(), &entity.key_value())
            .await
    }
}

impl<'a> dyn DataContext + 'a {
    /// Typed view of the table behind `E`
    pub fn set<E: Entity>(&self) -> EntitySet<'_, E> {
        EntitySet::new(self)
    }
}

fn encode<E: Entity>(entity: &E) -> Result<Value, StoreError> {
    serde_json::to_value(entity).map_err(|e| {
        StoreError::SerializationError(format!("encoding {}: {}", E::table_name(), e))
    })
}

fn decode<E: Entity>(row: Value) -> Result<E, StoreError> {
    serde_json::from_value(row).map_err(|e| {
        StoreError::SerializationError(format!("decoding {}: {}", E::table_name(), e))
    })
}
