//! Object mapping between entities and request/result shapes
//!
//! The pipeline only depends on the [`ObjectMapper`] contract; [`SerdeMapper`]
//! is the structural default.

pub mod errors;
pub mod mapper;

pub use errors::MappingError;
pub use mapper::{map_to, map_value_to, MapTarget, ObjectMapper, SerdeMapper, TypeKey};
