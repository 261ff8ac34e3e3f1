//! One handler per request shape
//!
//! Every handler follows the same template: request hooks, pre actions, item
//! hooks, entity selection or creation, entity hooks, staged writes, post
//! actions, results and result hooks, then the commit. Failures are returned
//! as [`CrudError`](crate::CrudError) and turned into responses by
//! [`Pipeline::finish`].

mod create;
mod delete;
mod get;
mod merge;
pub(crate) mod pipeline;
mod save;
mod update;

pub(crate) use create::{create, create_all};
pub(crate) use delete::{delete, delete_all};
pub(crate) use get::{get, get_all, paged_get_all};
pub(crate) use merge::{merge, synchronize};
pub(crate) use pipeline::Pipeline;
pub(crate) use save::save;
pub(crate) use update::{update, update_all};
