//! # Crudhaus
//!
//! A configuration-driven CRUD request pipeline. Requests are plain types bound
//! to an entity; profiles declare how entities are selected, created, updated,
//! filtered, sorted and hooked; the engine runs one generic handler per request
//! shape against a pluggable [`DataContext`](store_object::DataContext).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use crudhaus::prelude::*;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Entity, Lineage)]
//! #[entity(table = "users")]
//! pub struct User {
//!     #[key]
//!     pub id: i64,
//!     pub name: String,
//! }
//!
//! #[derive(Serialize, Lineage)]
//! pub struct GetUser {
//!     pub id: i64,
//! }
//!
//! impl CrudRequest for GetUser {
//!     const SHAPE: RequestShape = RequestShape::Get;
//!     type Entity = User;
//!     type Item = ();
//!     type Output = User;
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Crudhaus::builder()
//!         .profile(Profile::<GetUser, User>::new().request_key(Key::new("id", |r: &GetUser| r.id)))
//!         .handle::<GetUser>()
//!         .build()?;
//!
//!     let db = InMemoryDatabase::new();
//!     let data = db.context();
//!     let response = engine
//!         .get(&GetUser { id: 1 }, &data, &RequestContext::new())
//!         .await?;
//!     println!("{:?}", response.data);
//!     Ok(())
//! }
//! ```

/// Pipeline tracing, compiled in only with the `debug-logging` feature
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

// Lets the derive macros' `::crudhaus::` paths resolve inside this crate
extern crate self as crudhaus;

pub mod core;
pub mod error_handler;
pub mod errors;
pub mod filter;
mod handlers;
pub mod join;
pub mod key;
pub mod prelude;
pub mod profile;
pub mod request;
pub mod request_config;
pub mod response;
pub mod selector;
pub mod sorter;
pub mod validation;

// Re-export the main public types for convenience
pub use crate::core::{connect_database, Crudhaus, CrudhausBuilder};
pub use error_handler::{DefaultErrorHandler, ErrorHandler, MessageErrorHandler};
pub use errors::{CrudError, ErrorKind};
pub use filter::{ConditionalFilter, FnFilter, RequestFilter, ResolvedFilter};
pub use join::full_outer_join;
pub use key::Key;
pub use profile::{Options, Profile, ProfileRegistry};
pub use request::{CrudRequest, ItemRequest, ItemsRequest, PagedRequest, RequestShape};
pub use request_config::RequestConfig;
pub use response::{PagedResult, Response, ResponseError};
pub use selector::Selector;
pub use sorter::{
    BasicSorter, FnSorter, RequestSorter, ResolvedSorter, SortControl, SortOperation,
    SwitchSorter, TableSorter,
};
pub use validation::{ValidationFailure, Validator};

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, PipelineConfig};

// Derives share their names with the traits they implement
pub use crud_derive::{Entity, Lineage};

// Member crates; derive output refers to them by these paths
pub use hook_system;
pub use object_mapping;
pub use store_object;

// Re-export external dependencies used in public API
pub use anyhow;
pub use async_trait;
