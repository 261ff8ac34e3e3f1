//! Convenience re-exports for common hook-system usage

pub use crate::action::{ActionType, PostAction, PreAction};
pub use crate::cancellation::{CancellationSignal, Canceled};
pub use crate::context::RequestContext;
pub use crate::errors::HookError;
pub use crate::hooks::{EntityHook, ItemHook, RequestHook, ResultHook};
pub use crate::lineage::{Lineage, LineageVisitor};
pub use crate::services::{ServiceProvider, ServiceRegistry};
pub use crate::signal::{ChangeEvent, SignalManager};

pub use async_trait::async_trait;
