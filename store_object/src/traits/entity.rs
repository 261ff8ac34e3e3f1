//! Entity metadata

use crate::key_value::KeyValue;
use crate::traits::context::TableRef;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// A persistable record stored in one table under one primary key
///
/// Usually derived:
/// ```ignore
/// use crudhaus::Entity;
///
/// #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
/// #[entity(table = "customers")]
/// pub struct Customer {
///     #[key]
///     pub id: i64,
///     pub name: String,
/// }
/// ```
pub trait Entity: Clone + Send + Sync + Debug + Serialize + DeserializeOwned + 'static {
    /// The table name in the database
    fn table_name() -> &'static str;

    /// Name of the primary key field
    fn primary_key_field() -> &'static str;

    /// Current primary key value
    fn key_value(&self) -> KeyValue;

    fn table_ref() -> TableRef {
        TableRef::new(Self::table_name(), Self::primary_key_field())
    }
}
