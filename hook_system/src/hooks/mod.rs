//! The four hook kinds and their strategies
//!
//! Each kind comes in three flavours: a plain function ([`FnRequestHook`] and
//! friends), a shared instance (any `Arc<dyn RequestHook<R>>`), or a type
//! resolved from the request services when the hook runs ([`ResolvedRequestHook`]).
//! The `Upcast*` adapters let a hook written for an ancestor type run for a
//! descendant.

pub mod entity;
pub mod item;
pub mod request;
pub mod result;

pub use entity::{EntityHook, FnEntityHook, ResolvedEntityHook, UpcastEntityHook};
pub use item::{FnItemHook, ItemHook, ResolvedItemHook, UpcastItemHook};
pub use request::{FnRequestHook, RequestHook, ResolvedRequestHook, UpcastRequestHook};
pub use result::{FnResultHook, ResolvedResultHook, ResultHook, UpcastResultHook};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::services::ServiceRegistry;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    trait Stamped: Send + Sync {
        fn stamp(&mut self, by: &str);
    }

    struct Rename {
        name: String,
    }

    impl Named for Rename {
        fn name(&self) -> &str {
            &self.name
        }
    }

    #[derive(Default)]
    struct Account {
        stamped_by: Option<String>,
    }

    impl Stamped for Account {
        fn stamp(&mut self, by: &str) {
            self.stamped_by = Some(by.to_string());
        }
    }

    #[derive(Default)]
    struct CountingHook {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl RequestHook<Rename> for CountingHook {
        async fn run(&self, _request: &Rename, _ctx: &RequestContext) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn rename(name: &str) -> Rename {
        Rename {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_function_request_hook() {
        let hook = FnRequestHook::new(|request: &Rename| {
            anyhow::ensure!(!request.name.is_empty(), "name is required");
            Ok(())
        });
        let ctx = RequestContext::new();

        assert!(hook.run(&rename("a"), &ctx).await.is_ok());
        let err = hook.run(&rename(""), &ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "name is required");
    }

    #[tokio::test]
    async fn test_resolved_hook_uses_registered_instance() {
        let ctx = RequestContext::with_services(Arc::new(
            ServiceRegistry::new().singleton(CountingHook::default()),
        ));
        let hook: ResolvedRequestHook<CountingHook> = ResolvedRequestHook::new();

        hook.run(&rename("a"), &ctx).await.unwrap();
        hook.run(&rename("b"), &ctx).await.unwrap();
        assert_eq!(ctx.resolve::<CountingHook>().unwrap().runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_resolved_hook_without_registration_fails() {
        let hook: ResolvedRequestHook<CountingHook> = ResolvedRequestHook::new();
        let result = hook.run(&rename("a"), &RequestContext::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_upcast_hooks_see_ancestor_views() {
        let general: Arc<dyn RequestHook<dyn Named>> =
            Arc::new(FnRequestHook::new(|request: &(dyn Named + 'static)| {
                anyhow::ensure!(request.name() == "bob", "unexpected name");
                Ok(())
            }));
        let hook = UpcastRequestHook::<Rename, dyn Named>::new(general, |r| r);
        hook.run(&rename("bob"), &RequestContext::new()).await.unwrap();

        let stamp: Arc<dyn EntityHook<dyn Named, dyn Stamped>> = Arc::new(FnEntityHook::new(
            |request: &(dyn Named + 'static), entity: &mut (dyn Stamped + 'static)| {
                entity.stamp(request.name());
                Ok(())
            },
        ));
        let hook = UpcastEntityHook::<Rename, Account, dyn Named, dyn Stamped>::new(
            stamp,
            |r| r,
            |e| e,
        );
        let mut account = Account::default();
        hook.run(&rename("carol"), &mut account, &RequestContext::new())
            .await
            .unwrap();
        assert_eq!(account.stamped_by.as_deref(), Some("carol"));
    }

    #[tokio::test]
    async fn test_item_and_result_hooks_transform_values() {
        let trim = FnItemHook::new(|_: &Rename, item: String| Ok(item.trim().to_string()));
        let ctx = RequestContext::new();
        assert_eq!(trim.run(&rename("x"), "  y ".to_string(), &ctx).await.unwrap(), "y");

        let general: Arc<dyn ResultHook<dyn Named, u32>> =
            Arc::new(FnResultHook::new(|_: &(dyn Named + 'static), value: u32| Ok(value * 2)));
        let hook = UpcastResultHook::<Rename, dyn Named, u32>::new(general, |r| r);
        assert_eq!(hook.run(&rename("x"), 21, &ctx).await.unwrap(), 42);
    }
}
