use crate::cancellation::Canceled;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("request was canceled")]
    Canceled,

    #[error("hook {hook} failed: {cause:#}")]
    Failed { hook: String, cause: anyhow::Error },
}

impl HookError {
    /// Classify an error that escaped the hook named `hook`
    pub fn from_hook(hook: &str, cause: anyhow::Error) -> Self {
        if is_cancellation(&cause) {
            HookError::Canceled
        } else {
            HookError::Failed {
                hook: hook.to_string(),
                cause,
            }
        }
    }
}

/// Whether `error` carries a [`Canceled`] marker anywhere in its chain
pub fn is_cancellation(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| cause.is::<Canceled>())
}
