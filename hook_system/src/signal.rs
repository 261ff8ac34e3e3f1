//! Change notifications emitted after a request committed its changes

use crate::action::ActionType;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// One committed change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: Uuid,
    pub action: ActionType,
    pub table: String,
    /// Keys of the entities written by the request
    pub keys: Vec<Value>,
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(action: ActionType, table: impl Into<String>, request_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            table: table.into(),
            keys: Vec::new(),
            request_id,
            timestamp: Utc::now(),
        }
    }

    pub fn with_keys(mut self, keys: Vec<Value>) -> Self {
        self.keys = keys;
        self
    }
}

pub type EventCallback =
    Arc<dyn Fn(ChangeEvent) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

#[derive(Debug)]
pub struct EventProcessingError {
    pub callback_index: usize,
    pub error: anyhow::Error,
}

/// Fan-out of [`ChangeEvent`]s to async subscribers
pub struct SignalManager {
    callbacks: std::sync::RwLock<Vec<EventCallback>>,
}

impl std::fmt::Debug for SignalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalManager")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

impl Default for SignalManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalManager {
    pub fn new() -> Self {
        Self {
            callbacks: std::sync::RwLock::new(Vec::new()),
        }
    }

    pub fn add_callback<F, Fut>(&self, callback: F)
    where
        F: Fn(ChangeEvent) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let callback: EventCallback = Arc::new(move |event: ChangeEvent| {
            Box::pin(callback(event)) as BoxFuture<'static, anyhow::Result<()>>
        });
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.push(callback);
        }
    }

    /// Deliver `event` to every subscriber, collecting failures
    ///
    /// A failing subscriber does not stop delivery to the others.
    pub async fn emit(&self, event: ChangeEvent) -> Vec<EventProcessingError> {
        let callbacks: Vec<EventCallback> = match self.callbacks.read() {
            Ok(callbacks) => callbacks.clone(),
            Err(_) => return Vec::new(),
        };

        let mut errors = Vec::new();
        for (callback_index, callback) in callbacks.iter().enumerate() {
            if let Err(error) = callback(event.clone()).await {
                tracing::warn!(
                    table = %event.table,
                    action = %event.action,
                    callback_index,
                    "change event callback failed: {error:#}"
                );
                errors.push(EventProcessingError {
                    callback_index,
                    error,
                });
            }
        }
        errors
    }

    pub fn clear_callbacks(&self) {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.clear();
        }
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.read().map(|c| c.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_emit_reaches_every_callback() {
        let manager = SignalManager::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        manager.add_callback(move |event: ChangeEvent| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(event.table.clone());
                anyhow::Ok(())
            }
        });
        manager.add_callback(|_event: ChangeEvent| async {
            Err::<(), _>(anyhow::anyhow!("subscriber down"))
        });
        let sink = seen.clone();
        manager.add_callback(move |event: ChangeEvent| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(format!("{}:{}", event.action, event.keys.len()));
                anyhow::Ok(())
            }
        });

        let event = ChangeEvent::new(ActionType::Create, "users", Uuid::new_v4())
            .with_keys(vec![serde_json::json!(1), serde_json::json!(2)]);
        let errors = manager.emit(event).await;

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].callback_index, 1);
        assert_eq!(*seen.lock().unwrap(), vec!["users", "create:2"]);
    }

    #[test]
    fn test_clear_callbacks() {
        let manager = SignalManager::new();
        manager.add_callback(|_event: ChangeEvent| async { anyhow::Ok(()) });
        assert_eq!(manager.callback_count(), 1);
        manager.clear_callbacks();
        assert_eq!(manager.callback_count(), 0);
    }
}
