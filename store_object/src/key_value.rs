//! Key values
//!
//! Entity keys and request item keys are reduced to [`KeyValue`] so they can be
//! hashed, compared across types and turned back into query parameters.

use serde_json::Value;
use std::fmt::{self, Display};
use uuid::Uuid;

/// Hashable key that can hold any scalar primary key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyValue {
    /// Missing or null key
    Null,
    Bool(bool),
    /// Numeric key (i32, i64, etc.)
    Numeric(i64),
    Uuid(Uuid),
    String(String),
}

impl KeyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, KeyValue::Null)
    }

    /// Read a key back from a JSON row value
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => KeyValue::Null,
            Value::Bool(b) => KeyValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => KeyValue::Numeric(i),
                None => KeyValue::String(n.to_string()),
            },
            Value::String(s) => match Uuid::parse_str(s) {
                Ok(uuid) => KeyValue::Uuid(uuid),
                Err(_) => KeyValue::String(s.clone()),
            },
            other => KeyValue::String(other.to_string()),
        }
    }

    /// Read the key stored under `field` of a JSON row
    pub fn from_row(row: &Value, field: &str) -> Self {
        row.get(field).map(Self::from_json).unwrap_or(KeyValue::Null)
    }

    pub fn to_json(&self) -> Value {
        match self {
            KeyValue::Null => Value::Null,
            KeyValue::Bool(b) => Value::Bool(*b),
            KeyValue::Numeric(n) => Value::from(*n),
            KeyValue::Uuid(uuid) => Value::String(uuid.to_string()),
            KeyValue::String(s) => Value::String(s.clone()),
        }
    }
}

impl Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Null => f.write_str("null"),
            KeyValue::Bool(b) => write!(f, "{}", b),
            KeyValue::Numeric(n) => write!(f, "{}", n),
            KeyValue::Uuid(uuid) => write!(f, "{}", uuid),
            KeyValue::String(s) => f.write_str(s),
        }
    }
}

/// Conversion of key-like field types into [`KeyValue`]
pub trait HasKeyValue {
    fn key_value(&self) -> KeyValue;
}

macro_rules! numeric_key {
    ($($ty:ty),*) => {
        $(
            impl HasKeyValue for $ty {
                fn key_value(&self) -> KeyValue {
                    KeyValue::Numeric(*self as i64)
                }
            }

            impl From<$ty> for KeyValue {
                fn from(value: $ty) -> Self {
                    KeyValue::Numeric(value as i64)
                }
            }
        )*
    };
}

numeric_key!(i16, i32, i64, u16, u32);

impl HasKeyValue for u64 {
    fn key_value(&self) -> KeyValue {
        // Values past i64::MAX cannot be stored numerically
        i64::try_from(*self)
            .map(KeyValue::Numeric)
            .unwrap_or_else(|_| KeyValue::String(self.to_string()))
    }
}

impl HasKeyValue for bool {
    fn key_value(&self) -> KeyValue {
        KeyValue::Bool(*self)
    }
}

impl HasKeyValue for Uuid {
    fn key_value(&self) -> KeyValue {
        KeyValue::Uuid(*self)
    }
}

impl HasKeyValue for String {
    fn key_value(&self) -> KeyValue {
        KeyValue::String(self.clone())
    }
}

impl HasKeyValue for &str {
    fn key_value(&self) -> KeyValue {
        KeyValue::String(self.to_string())
    }
}

impl HasKeyValue for KeyValue {
    fn key_value(&self) -> KeyValue {
        self.clone()
    }
}

impl<T: HasKeyValue> HasKeyValue for Option<T> {
    fn key_value(&self) -> KeyValue {
        match self {
            Some(inner) => inner.key_value(),
            None => KeyValue::Null,
        }
    }
}

impl From<Uuid> for KeyValue {
    fn from(value: Uuid) -> Self {
        KeyValue::Uuid(value)
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::String(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::String(value.to_string())
    }
}
