//! Object mapper contract and the serde-backed default

use crate::errors::MappingError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// A Rust type identified at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Source and destination of one mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapTarget {
    pub source: TypeKey,
    pub destination: TypeKey,
}

impl MapTarget {
    pub fn of<S: ?Sized + 'static, D: ?Sized + 'static>() -> Self {
        Self {
            source: TypeKey::of::<S>(),
            destination: TypeKey::of::<D>(),
        }
    }
}

/// Maps serialized objects between shapes
///
/// Values cross the boundary as JSON so the pipeline can hold one
/// `Arc<dyn ObjectMapper>` for every pair of types.
pub trait ObjectMapper: Send + Sync {
    fn map(&self, source: Value, target: &MapTarget) -> Result<Value, MappingError>;

    /// Source fields the destination is built from, for query pushdown
    ///
    /// `None` means the mapper needs the complete source object.
    fn projection(&self, _target: &MapTarget) -> Option<Vec<String>> {
        None
    }
}

/// Typed convenience over [`ObjectMapper::map`]
pub fn map_to<S, D>(mapper: &dyn ObjectMapper, source: &S) -> Result<D, MappingError>
where
    S: Serialize + 'static,
    D: DeserializeOwned + 'static,
{
    map_value_to::<S, D>(mapper, serde_json::to_value(source)?)
}

/// Map an already serialized `S` into `D`
pub fn map_value_to<S, D>(mapper: &dyn ObjectMapper, source: Value) -> Result<D, MappingError>
where
    S: ?Sized + 'static,
    D: DeserializeOwned + 'static,
{
    let target = MapTarget::of::<S, D>();
    let mapped = mapper.map(source, &target)?;
    serde_json::from_value(mapped).map_err(|e| MappingError::conversion(&target, e))
}

type Converter = Arc<dyn Fn(Value) -> Result<Value, MappingError> + Send + Sync>;

/// Structural mapper: fields with the same name carry over
///
/// Specific pairs can be given a converter function, field renames, or a
/// projection list. Unknown source fields are left for the destination's
/// `Deserialize` impl to ignore.
#[derive(Default, Clone)]
pub struct SerdeMapper {
    converters: HashMap<MapTarget, Converter>,
    renames: HashMap<MapTarget, Vec<(String, String)>>,
    projections: HashMap<MapTarget, Vec<String>>,
}

impl std::fmt::Debug for SerdeMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerdeMapper")
            .field("converters", &self.converters.len())
            .field("renames", &self.renames.len())
            .field("projections", &self.projections.len())
            .finish()
    }
}

impl SerdeMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace structural mapping for `S -> D` with a function
    pub fn with_converter<S, D, F>(mut self, convert: F) -> Self
    where
        S: DeserializeOwned + 'static,
        D: Serialize + 'static,
        F: Fn(S) -> D + Send + Sync + 'static,
    {
        let target = MapTarget::of::<S, D>();
        let converter: Converter = Arc::new(move |value: Value| {
            let source: S = serde_json::from_value(value)
                .map_err(|e| MappingError::conversion(&target, e))?;
            Ok(serde_json::to_value(convert(source))?)
        });
        self.converters.insert(target, converter);
        self
    }

    /// Source field `from` becomes destination field `to`
    pub fn with_rename<S: 'static, D: 'static>(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.renames
            .entry(MapTarget::of::<S, D>())
            .or_default()
            .push((from.into(), to.into()));
        self
    }

    /// Declare which source fields `D` needs
    pub fn with_projection<S: 'static, D: 'static>(mut self, fields: &[&str]) -> Self {
        self.projections.insert(
            MapTarget::of::<S, D>(),
            fields.iter().map(|f| f.to_string()).collect(),
        );
        self
    }
}

impl ObjectMapper for SerdeMapper {
    fn map(&self, source: Value, target: &MapTarget) -> Result<Value, MappingError> {
        if let Some(converter) = self.converters.get(target) {
            return converter(source);
        }

        let Some(renames) = self.renames.get(target) else {
            return Ok(source);
        };

        match source {
            Value::Object(mut fields) => {
                for (from, to) in renames {
                    if let Some(value) = fields.remove(from) {
                        fields.insert(to.clone(), value);
                    }
                }
                Ok(Value::Object(fields))
            }
            other => Err(MappingError::conversion(
                target,
                format!("field renames need an object, got {other}"),
            )),
        }
    }

    fn projection(&self, target: &MapTarget) -> Option<Vec<String>> {
        if self.converters.contains_key(target) {
            return None;
        }
        self.projections.get(target).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct User {
        id: i64,
        full_name: String,
        password: String,
    }

    #[derive(Debug, PartialEq, Deserialize, Serialize)]
    struct UserDto {
        id: i64,
        full_name: String,
    }

    #[derive(Debug, PartialEq, Deserialize, Serialize)]
    struct NameDto {
        name: String,
    }

    fn user() -> User {
        User {
            id: 7,
            full_name: "Ada Lovelace".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_structural_mapping_drops_unknown_fields() {
        let mapper = SerdeMapper::new();
        let dto: UserDto = map_to::<User, UserDto>(&mapper, &user()).unwrap();
        assert_eq!(
            dto,
            UserDto {
                id: 7,
                full_name: "Ada Lovelace".to_string()
            }
        );
    }

    #[test]
    fn test_rename() {
        let mapper = SerdeMapper::new().with_rename::<User, NameDto>("full_name", "name");
        let dto: NameDto = map_to::<User, NameDto>(&mapper, &user()).unwrap();
        assert_eq!(dto.name, "Ada Lovelace");
    }

    #[test]
    fn test_converter_wins() {
        let mapper = SerdeMapper::new()
            .with_converter(|u: User| NameDto {
                name: u.full_name.to_uppercase(),
            })
            .with_projection::<User, NameDto>(&["full_name"]);

        let dto: NameDto = map_to::<User, NameDto>(&mapper, &user()).unwrap();
        assert_eq!(dto.name, "ADA LOVELACE");
        assert_eq!(mapper.projection(&MapTarget::of::<User, NameDto>()), None);
    }

    #[test]
    fn test_projection_lookup() {
        let mapper = SerdeMapper::new().with_projection::<User, UserDto>(&["id", "full_name"]);
        assert_eq!(
            mapper.projection(&MapTarget::of::<User, UserDto>()),
            Some(vec!["id".to_string(), "full_name".to_string()])
        );
        assert_eq!(mapper.projection(&MapTarget::of::<User, NameDto>()), None);
    }

    #[test]
    fn test_missing_field_is_conversion_error() {
        let mapper = SerdeMapper::new();
        let err = map_value_to::<User, UserDto>(&mapper, json!({ "id": 1 })).unwrap_err();
        assert!(matches!(err, MappingError::Conversion { .. }));
    }
}
