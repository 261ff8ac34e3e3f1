//! Error types for the crudhaus pipeline
//!
//! Every failure inside a handler becomes a [`CrudError`]. Its [`ErrorKind`] is
//! what error handlers and response envelopes work with.

use hook_system::HookError;
use object_mapping::MappingError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use store_object::StoreError;
use thiserror::Error;

/// Classification of a pipeline failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    RequestFailed,
    FailedToFind,
    RequestCanceled,
    HookFailed,
    CreateEntityFailed,
    UpdateEntityFailed,
    CreateResultFailed,
    RequestTypeMismatch,
    BadConfiguration,
    ValidationFailed,
}

#[derive(Error, Debug)]
pub enum CrudError {
    #[error("request failed: {reason}")]
    RequestFailed { request: Value, reason: String },

    #[error("failed to find {entity}")]
    FailedToFind { entity: &'static str, request: Value },

    #[error("request was canceled")]
    RequestCanceled,

    #[error("hook {hook} failed: {cause:#}")]
    HookFailed { hook: String, cause: anyhow::Error },

    #[error("failed to create entity: {cause:#}")]
    CreateEntityFailed { item: Value, cause: anyhow::Error },

    #[error("failed to update entity: {cause:#}")]
    UpdateEntityFailed {
        item: Value,
        entity: Value,
        cause: anyhow::Error,
    },

    #[error("failed to create result: {cause:#}")]
    CreateResultFailed { entity: Value, cause: anyhow::Error },

    #[error("request type mismatch: expected {expected}, got {actual}")]
    RequestTypeMismatch {
        actual: &'static str,
        expected: &'static str,
    },

    #[error("bad configuration: {0}")]
    BadConfiguration(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),
}

impl CrudError {
    /// Fixed dispatch from error to kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            CrudError::RequestFailed { .. } | CrudError::Storage(_) | CrudError::Mapping(_) => {
                ErrorKind::RequestFailed
            }
            CrudError::FailedToFind { .. } => ErrorKind::FailedToFind,
            CrudError::RequestCanceled => ErrorKind::RequestCanceled,
            CrudError::HookFailed { .. } => ErrorKind::HookFailed,
            CrudError::CreateEntityFailed { .. } => ErrorKind::CreateEntityFailed,
            CrudError::UpdateEntityFailed { .. } => ErrorKind::UpdateEntityFailed,
            CrudError::CreateResultFailed { .. } => ErrorKind::CreateResultFailed,
            CrudError::RequestTypeMismatch { .. } => ErrorKind::RequestTypeMismatch,
            CrudError::BadConfiguration(_) => ErrorKind::BadConfiguration,
        }
    }

    pub fn request_failed(request: Value, reason: impl std::fmt::Display) -> Self {
        CrudError::RequestFailed {
            request,
            reason: reason.to_string(),
        }
    }

    pub fn bad_configuration(message: impl Into<String>) -> Self {
        CrudError::BadConfiguration(message.into())
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, CrudError::RequestCanceled)
    }
}

impl From<HookError> for CrudError {
    fn from(err: HookError) -> Self {
        match err {
            HookError::Canceled => CrudError::RequestCanceled,
            HookError::Failed { hook, cause } => CrudError::HookFailed { hook, cause },
        }
    }
}

impl From<hook_system::Canceled> for CrudError {
    fn from(_: hook_system::Canceled) -> Self {
        CrudError::RequestCanceled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hook_system::Canceled;

    #[test]
    fn test_kind_dispatch() {
        assert_eq!(
            CrudError::from(StoreError::not_found("users", "1")).kind(),
            ErrorKind::RequestFailed
        );
        assert_eq!(CrudError::from(Canceled).kind(), ErrorKind::RequestCanceled);
        assert_eq!(
            CrudError::from(HookError::from_hook("audit", anyhow::anyhow!("no"))).kind(),
            ErrorKind::HookFailed
        );
        assert_eq!(
            CrudError::from(HookError::from_hook("audit", anyhow::Error::new(Canceled))).kind(),
            ErrorKind::RequestCanceled
        );
    }

    #[test]
    fn test_messages() {
        let err = CrudError::RequestTypeMismatch {
            actual: "GetOrder",
            expected: "GetUser",
        };
        assert_eq!(
            err.to_string(),
            "request type mismatch: expected GetUser, got GetOrder"
        );
        assert_eq!(
            CrudError::bad_configuration("no selector").to_string(),
            "bad configuration: no selector"
        );
    }
}
