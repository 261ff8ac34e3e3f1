//! Typed key accessors

use std::any::type_name;
use std::fmt;
use std::sync::Arc;
use store_object::{Entity, HasKeyValue, KeyValue};

type KeyFn<T> = Arc<dyn Fn(&T) -> KeyValue + Send + Sync>;

/// Reads a comparable key out of a `T`
///
/// The optional field names the storage column the key lives in, which is what
/// lets a key take part in building queries rather than only in comparisons.
pub struct Key<T: ?Sized> {
    key_type: &'static str,
    field: Option<&'static str>,
    accessor: KeyFn<T>,
}

impl<T: ?Sized> Clone for Key<T> {
    fn clone(&self) -> Self {
        Self {
            key_type: self.key_type,
            field: self.field,
            accessor: Arc::clone(&self.accessor),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("key_type", &self.key_type)
            .field("field", &self.field)
            .finish()
    }
}

impl<T: ?Sized + 'static> Key<T> {
    /// Key stored in `field`
    pub fn new<K, F>(field: &'static str, accessor: F) -> Self
    where
        K: HasKeyValue + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self {
            key_type: type_name::<K>(),
            field: Some(field),
            accessor: Arc::new(move |value: &T| accessor(value).key_value()),
        }
    }

    /// Key with no storage column, usable for correlation only
    pub fn computed<K, F>(accessor: F) -> Self
    where
        K: HasKeyValue + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self {
            key_type: type_name::<K>(),
            field: None,
            accessor: Arc::new(move |value: &T| accessor(value).key_value()),
        }
    }

    pub fn get(&self, value: &T) -> KeyValue {
        (self.accessor)(value)
    }

    pub fn key_type(&self) -> &'static str {
        self.key_type
    }

    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    /// View this key through a descendant type
    pub fn upcast<D: ?Sized + 'static>(&self, upcast: fn(&D) -> &T) -> Key<D> {
        let accessor = Arc::clone(&self.accessor);
        Key {
            key_type: self.key_type,
            field: self.field,
            accessor: Arc::new(move |value: &D| accessor(upcast(value))),
        }
    }
}

impl<E: Entity> Key<E> {
    /// The entity's primary key
    pub fn primary() -> Self {
        Self {
            key_type: type_name::<KeyValue>(),
            field: Some(E::primary_key_field()),
            accessor: Arc::new(|entity: &E| entity.key_value()),
        }
    }
}
