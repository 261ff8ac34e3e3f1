//! Convenience re-exports for common crudhaus usage
//!
//! ```rust,ignore
//! use crudhaus::prelude::*;
//! ```

// Engine and configuration
pub use crate::core::{connect_database, Crudhaus, CrudhausBuilder};
pub use crate::key::Key;
pub use crate::profile::Profile;
pub use crate::request::{CrudRequest, ItemRequest, ItemsRequest, PagedRequest, RequestShape};

// Query shaping
pub use crate::filter::RequestFilter;
pub use crate::sorter::{
    BasicSorter, RequestSorter, SortControl, SortOperation, SwitchSorter, TableSorter,
};

// Results and errors
pub use crate::error_handler::{ErrorHandler, MessageErrorHandler};
pub use crate::errors::{CrudError, ErrorKind};
pub use crate::response::{PagedResult, Response, ResponseError};
pub use crate::validation::{ValidationFailure, Validator};

// Derive macros
pub use crud_derive::{Entity, Lineage};

// Re-export centralized config
pub use config::{AppConfig, PipelineConfig};

// Hooks, context and lineage
pub use hook_system::prelude::*;

// Storage
pub use store_object::prelude::*;

// Object mapping
pub use object_mapping::{ObjectMapper, SerdeMapper};

// Common external dependencies
pub use anyhow;
pub use tokio;
