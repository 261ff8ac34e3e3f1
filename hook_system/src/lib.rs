//! Hook system for the crudhaus request pipeline
//!
//! This crate holds everything that runs *around* a request: the four hook
//! kinds, pre and post actions, cooperative cancellation, the per-request
//! context with its service lookup, type lineage used to apply hooks
//! registered for ancestor types, and change notifications.

pub mod action;
pub mod cancellation;
pub mod context;
pub mod errors;
pub mod hooks;
pub mod lineage;
pub mod prelude;
pub mod services;
pub mod signal;

pub use action::{upcast_post_action, upcast_pre_action, ActionType, PostAction, PreAction};
pub use cancellation::{CancellationSignal, Canceled};
pub use context::RequestContext;
pub use errors::{is_cancellation, HookError};
pub use hooks::*;
pub use lineage::{descends_from, identity, identity_mut, lineage_names, walk, Lineage, LineageVisitor};
pub use services::{ServiceError, ServiceProvider, ServiceRegistry, SharedService};
pub use signal::{ChangeEvent, EventCallback, EventProcessingError, SignalManager};
