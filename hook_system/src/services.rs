//! Service lookup for lazily resolved hooks, filters and sorters
//!
//! Services are passed explicitly through the [`RequestContext`](crate::RequestContext);
//! there is no global container.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub type SharedService = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("service {0} is not registered")]
    NotRegistered(&'static str),
}

/// Produces an instance given a type
pub trait ServiceProvider: Send + Sync {
    fn resolve_any(&self, type_id: TypeId) -> Option<SharedService>;
}

impl dyn ServiceProvider + '_ {
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ServiceError> {
        self.resolve_any(TypeId::of::<T>())
            .and_then(|service| service.downcast::<T>().ok())
            .ok_or(ServiceError::NotRegistered(type_name::<T>()))
    }
}

enum Registration {
    Singleton(SharedService),
    Transient(Arc<dyn Fn() -> SharedService + Send + Sync>),
}

/// Map-backed [`ServiceProvider`]
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<TypeId, Registration>,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("service_count", &self.services.len())
            .finish()
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one shared instance
    pub fn singleton<T: Send + Sync + 'static>(mut self, service: T) -> Self {
        self.services
            .insert(TypeId::of::<T>(), Registration::Singleton(Arc::new(service)));
        self
    }

    /// Register a factory called on every resolution
    pub fn transient<T, F>(mut self, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.services.insert(
            TypeId::of::<T>(),
            Registration::Transient(Arc::new(move || Arc::new(factory()) as SharedService)),
        );
        self
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }
}

impl ServiceProvider for ServiceRegistry {
    fn resolve_any(&self, type_id: TypeId) -> Option<SharedService> {
        match self.services.get(&type_id)? {
            Registration::Singleton(service) => Some(Arc::clone(service)),
            Registration::Transient(factory) => Some(factory()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Clock(u64);

    #[test]
    fn test_singleton_is_shared() {
        let registry: Arc<dyn ServiceProvider> = Arc::new(ServiceRegistry::new().singleton(Clock(5)));
        let a = registry.resolve::<Clock>().unwrap();
        let b = registry.resolve::<Clock>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.0, 5);
    }

    #[test]
    fn test_transient_builds_each_time() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();
        let registry = ServiceRegistry::new().transient(move || {
            Clock(counter.fetch_add(1, Ordering::SeqCst) as u64)
        });
        let provider: &dyn ServiceProvider = &registry;

        assert_eq!(provider.resolve::<Clock>().unwrap().0, 0);
        assert_eq!(provider.resolve::<Clock>().unwrap().0, 1);
        assert!(registry.contains::<Clock>());
    }

    #[test]
    fn test_missing_service() {
        let provider: &dyn ServiceProvider = &ServiceRegistry::new();
        assert!(matches!(
            provider.resolve::<Clock>(),
            Err(ServiceError::NotRegistered(_))
        ));
    }
}
