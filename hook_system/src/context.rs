//! Per-request execution context

use crate::cancellation::{CancellationSignal, Canceled};
use crate::services::{ServiceError, ServiceProvider, ServiceRegistry};
use std::sync::Arc;
use uuid::Uuid;

/// Identity, cancellation and services of one in-flight request
#[derive(Clone)]
pub struct RequestContext {
    request_id: Uuid,
    cancellation: CancellationSignal,
    services: Arc<dyn ServiceProvider>,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("canceled", &self.cancellation.is_canceled())
            .finish()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    pub fn new() -> Self {
        Self::with_services(Arc::new(ServiceRegistry::new()))
    }

    pub fn with_services(services: Arc<dyn ServiceProvider>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            cancellation: CancellationSignal::new(),
            services,
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationSignal) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn cancellation(&self) -> &CancellationSignal {
        &self.cancellation
    }

    pub fn services(&self) -> &dyn ServiceProvider {
        self.services.as_ref()
    }

    pub fn check_canceled(&self) -> Result<(), Canceled> {
        self.cancellation.check()
    }

    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ServiceError> {
        self.services().resolve::<T>()
    }
}
