//! End-to-end runs of every handler against the in-memory store

mod common;

use common::*;
use crudhaus::prelude::*;
use std::sync::{Arc, Mutex};

fn dto(id: i64, name: &str) -> UserDto {
    UserDto {
        id,
        name: name.to_string(),
    }
}

#[tokio::test]
async fn test_create_writes_and_returns_result() {
    let engine = builder().build().unwrap();
    let db = seeded().await;
    let ctx = RequestContext::new();

    let request = CreateUser {
        user: NewUser::new(10, "dora"),
    };
    let response = engine.create(&request, &db.context(), &ctx).await.unwrap();

    assert_eq!(response.data, Some(dto(10, "dora")));
    assert_eq!(names(&db).await, vec!["ann", "bob", "cid", "dora"]);
}

#[tokio::test]
async fn test_create_all_creates_every_item() {
    let engine = builder().build().unwrap();
    let db = InMemoryDatabase::new();

    let request = CreateUsers {
        users: vec![NewUser::new(1, "eve"), NewUser::new(2, "fay")],
    };
    let response = engine
        .create_all(&request, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(response.data, Some(vec![dto(1, "eve"), dto(2, "fay")]));
    assert_eq!(names(&db).await, vec!["eve", "fay"]);
}

#[tokio::test]
async fn test_get_by_request_key() {
    let engine = builder().build().unwrap();
    let db = seeded().await;

    let response = engine
        .get(&GetUser { id: 2 }, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(response.data, Some(dto(2, "bob")));
}

#[tokio::test]
async fn test_get_all_applies_filters_and_sorting() {
    let engine = builder().build().unwrap();
    let db = seeded().await;
    let ctx = RequestContext::new();

    let request = ListUsers {
        active_only: true,
        sort: vec![("name".to_string(), false)],
    };
    let response = engine.get_all(&request, &db.context(), &ctx).await.unwrap();
    assert_eq!(response.data, Some(vec![dto(3, "cid"), dto(1, "ann")]));

    let everyone = engine
        .get_all(&ListUsers::default(), &db.context(), &ctx)
        .await
        .unwrap();
    assert_eq!(everyone.data.map(|users| users.len()), Some(3));
}

#[tokio::test]
async fn test_paged_get_all() {
    let engine = builder().build().unwrap();
    let db = seeded().await;
    let ctx = RequestContext::new();

    let page = engine
        .paged_get_all(&PageUsers { page: 2, size: 2 }, &db.context(), &ctx)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(page.items, vec![dto(3, "cid")]);
    assert_eq!(page.page_number, 2);
    assert_eq!(page.page_count, 2);
    assert_eq!(page.total_count, 3);

    // Page zero reads as the first page
    let first = engine
        .paged_get_all(&PageUsers { page: 0, size: 2 }, &db.context(), &ctx)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(first.page_number, 1);
    assert_eq!(first.items, vec![dto(1, "ann"), dto(2, "bob")]);

    let unpaged = engine
        .paged_get_all(&PageUsers { page: 5, size: 0 }, &db.context(), &ctx)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(unpaged.page_number, 1);
    assert_eq!(unpaged.page_count, 1);
    assert_eq!(unpaged.items.len(), 3);
}

#[tokio::test]
async fn test_update_overlays_item_fields() {
    let engine = builder().build().unwrap();
    let db = seeded().await;

    let request = RenameUser {
        patch: UserPatch {
            id: 1,
            name: "annie".to_string(),
        },
    };
    let response = engine
        .update(&request, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(response.data, Some(dto(1, "annie")));
    let rows = db.rows("users").await;
    assert_eq!(rows[0]["name"], "annie");
    assert_eq!(rows[0]["email"], "ann@example.com");
}

#[tokio::test]
async fn test_update_of_missing_entity_fails_to_find() {
    let engine = builder().build().unwrap();
    let db = seeded().await;

    let request = RenameUser {
        patch: UserPatch {
            id: 99,
            name: "ghost".to_string(),
        },
    };
    let response = engine
        .update(&request, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert!(response.has_error(ErrorKind::FailedToFind));
    assert!(response.data.is_none());
}

#[tokio::test]
async fn test_update_all_updates_matched_entities() {
    let engine = builder().build().unwrap();
    let db = seeded().await;

    let request = RenameUsers {
        patches: vec![
            UserPatch {
                id: 3,
                name: "cyd".to_string(),
            },
            UserPatch {
                id: 1,
                name: "anne".to_string(),
            },
        ],
    };
    let response = engine
        .update_all(&request, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    let mut updated = response.data.unwrap();
    updated.sort_by_key(|user| user.id);
    assert_eq!(updated, vec![dto(1, "anne"), dto(3, "cyd")]);
    assert_eq!(names(&db).await, vec!["anne", "bob", "cyd"]);
}

#[tokio::test]
async fn test_update_all_skips_unmatched_items_when_lenient() {
    let engine = builder()
        .profile(Profile::<RenameUsers, User>::new().failed_to_find_is_error(false))
        .build()
        .unwrap();
    let db = seeded().await;

    let request = RenameUsers {
        patches: vec![
            UserPatch {
                id: 2,
                name: "rob".to_string(),
            },
            UserPatch {
                id: 42,
                name: "nobody".to_string(),
            },
        ],
    };
    let response = engine
        .update_all(&request, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(response.data, Some(vec![dto(2, "rob")]));
}

#[tokio::test]
async fn test_delete_removes_entity() {
    let engine = builder().build().unwrap();
    let db = seeded().await;

    let response = engine
        .delete(&DeleteUser { id: 2 }, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.data, Some(()));
    assert_eq!(names(&db).await, vec!["ann", "cid"]);
}

#[tokio::test]
async fn test_delete_all_uses_selector() {
    let engine = builder().build().unwrap();
    let db = seeded().await;

    let response = engine
        .delete_all(&DeleteInactive, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(response.data, Some(vec![dto(2, "bob")]));
    assert_eq!(names(&db).await, vec!["ann", "cid"]);
}

#[tokio::test]
async fn test_save_updates_or_creates() {
    let engine = builder().build().unwrap();
    let db = seeded().await;
    let ctx = RequestContext::new();

    let existing = SaveUser {
        user: NewUser::new(2, "bobby"),
    };
    let response = engine.save(&existing, &db.context(), &ctx).await.unwrap();
    assert_eq!(response.data, Some(dto(2, "bobby")));

    let fresh = SaveUser {
        user: NewUser::new(7, "gus"),
    };
    let response = engine.save(&fresh, &db.context(), &ctx).await.unwrap();
    assert_eq!(response.data, Some(dto(7, "gus")));

    assert_eq!(names(&db).await, vec!["ann", "bobby", "cid", "gus"]);
}

#[tokio::test]
async fn test_merge_creates_updates_and_deletes() {
    let engine = builder().build().unwrap();
    let db = seeded().await;

    let request = MergeUsers {
        users: vec![NewUser::new(1, "anna"), NewUser::new(4, "dan")],
    };
    let response = engine
        .merge(&request, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    let mut saved = response.data.unwrap();
    saved.sort_by_key(|user| user.id);
    assert_eq!(saved, vec![dto(1, "anna"), dto(4, "dan")]);
    assert_eq!(names(&db).await, vec!["anna", "dan"]);
}

#[tokio::test]
async fn test_synchronize_leaves_unmatched_entities() {
    let engine = builder().build().unwrap();
    let db = seeded().await;

    let request = SyncUsers {
        users: vec![NewUser::new(1, "anna"), NewUser::new(4, "dan")],
    };
    let response = engine
        .synchronize(&request, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(response.data.map(|users| users.len()), Some(2));
    assert_eq!(names(&db).await, vec!["anna", "bob", "cid", "dan"]);
}

#[tokio::test]
async fn test_change_events_follow_commit() {
    let signals = Arc::new(SignalManager::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    signals.add_callback(move |event: ChangeEvent| {
        let sink = sink.clone();
        async move {
            sink.lock().unwrap().push((event.action, event.table, event.keys));
            Ok(())
        }
    });

    let engine = builder().signals(signals).build().unwrap();
    let db = seeded().await;
    let ctx = RequestContext::new();

    engine
        .save(
            &SaveUser {
                user: NewUser::new(9, "ivy"),
            },
            &db.context(),
            &ctx,
        )
        .await
        .unwrap();
    engine
        .delete(&DeleteUser { id: 1 }, &db.context(), &ctx)
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, ActionType::Create);
    assert_eq!(seen[0].1, "users");
    assert_eq!(seen[0].2, vec![serde_json::json!(9)]);
    assert_eq!(seen[1].0, ActionType::Delete);
}

#[tokio::test]
async fn test_validation_failure_skips_handler() {
    let engine = builder()
        .validator::<CreateUser, _>(|request: &CreateUser| {
            (request.user.name.is_empty())
                .then(|| vec![ValidationFailure::new("user.name", "name is required")])
        })
        .build()
        .unwrap();
    let db = seeded().await;

    let request = CreateUser {
        user: NewUser::new(11, ""),
    };
    let response = engine
        .create(&request, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert!(response.has_error(ErrorKind::ValidationFailed));
    assert_eq!(response.errors[0].property.as_deref(), Some("user.name"));
    assert_eq!(db.rows("users").await.len(), 3);
}

#[tokio::test]
async fn test_failing_hook_writes_nothing() {
    let engine = builder()
        .profile(
            Profile::<CreateUsers, User>::new().entity_hook(|_, user: &mut User| {
                if user.id == 2 {
                    anyhow::bail!("user 2 is reserved");
                }
                Ok(())
            }),
        )
        .build()
        .unwrap();
    let db = InMemoryDatabase::new();

    let request = CreateUsers {
        users: vec![NewUser::new(1, "eve"), NewUser::new(2, "fay")],
    };
    let response = engine
        .create_all(&request, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert!(response.has_error(ErrorKind::HookFailed));
    assert!(db.rows("users").await.is_empty());
}

#[tokio::test]
async fn test_custom_error_handler_rewrites_messages() {
    let engine = builder()
        .profile(Profile::<GetUser, User>::new().error_handler(MessageErrorHandler::new(
            |kind, _| (kind == ErrorKind::FailedToFind).then(|| "no such user".to_string()),
        )))
        .build()
        .unwrap();
    let db = seeded().await;

    let response = engine
        .get(&GetUser { id: 50 }, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "no such user");
}

#[tokio::test]
async fn test_unregistered_request_is_bad_configuration() {
    let engine = Crudhaus::builder().build().unwrap();
    let db = seeded().await;

    let error = engine
        .get(&GetUser { id: 1 }, &db.context(), &RequestContext::new())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::BadConfiguration);
}

#[tokio::test]
async fn test_projection_reads_only_mapped_fields() {
    let mapper = SerdeMapper::new()
        .with_projection::<User, UserDto>(&["id", "email"])
        .with_rename::<User, UserDto>("email", "name");
    let engine = builder()
        .mapper(mapper)
        .profile(Profile::<ListUsers, User>::new().use_projection(true))
        .build()
        .unwrap();
    let db = seeded().await;

    let response = engine
        .get_all(&ListUsers::default(), &db.context(), &RequestContext::new())
        .await
        .unwrap();

    let users = response.data.unwrap();
    assert_eq!(users[0], dto(1, "ann@example.com"));
    assert_eq!(users.len(), 3);
}

#[tokio::test]
async fn test_result_creator_replaces_mapping() {
    let engine = builder()
        .profile(
            Profile::<GetUser, User>::new().result_creator(|user: &User| {
                Ok(UserDto {
                    id: user.id,
                    name: user.email.clone(),
                })
            }),
        )
        .build()
        .unwrap();
    let db = seeded().await;

    let response = engine
        .get(&GetUser { id: 3 }, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(response.data, Some(dto(3, "cid@example.com")));
}

#[tokio::test]
async fn test_get_orders_matches_before_taking_one() {
    let engine = builder()
        .profile(
            Profile::<GetUser, User>::new()
                .select(|_| QueryFilter::eq("active", serde_json::Value::Bool(true)))
                .sorter(BasicSorter::new().operation(SortOperation::descending("id"))),
        )
        .build()
        .unwrap();
    let db = seeded().await;

    let response = engine
        .get(&GetUser { id: 1 }, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(response.data, Some(dto(3, "cid")));
}

#[tokio::test]
async fn test_paged_get_all_past_the_last_page() {
    let engine = builder().build().unwrap();
    let db = seeded().await;

    let page = engine
        .paged_get_all(
            &PageUsers {
                page: u64::MAX,
                size: 2,
            },
            &db.context(),
            &RequestContext::new(),
        )
        .await
        .unwrap()
        .data
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.page_number, u64::MAX);
    assert_eq!(page.page_count, 2);
    assert_eq!(page.total_count, 3);
}

#[tokio::test]
async fn test_failing_creator_writes_nothing() {
    let engine = builder()
        .profile(
            Profile::<CreateUsers, User>::new().creator(|item: NewUser| {
                if item.id == 2 {
                    anyhow::bail!("no user 2");
                }
                Ok(User {
                    id: item.id,
                    name: item.name,
                    email: item.email,
                    active: true,
                    notes: Vec::new(),
                })
            }),
        )
        .build()
        .unwrap();
    let db = seeded().await;

    let request = CreateUsers {
        users: vec![NewUser::new(10, "eve"), NewUser::new(2, "fay")],
    };
    let response = engine
        .create_all(&request, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert!(response.has_error(ErrorKind::CreateEntityFailed));
    assert!(response.data.is_none());
    assert_eq!(names(&db).await, vec!["ann", "bob", "cid"]);
}

#[tokio::test]
async fn test_failing_updater_writes_nothing() {
    let engine = builder()
        .profile(
            Profile::<RenameUsers, User>::new().updater(|patch: UserPatch, mut user: User| {
                if patch.id == 2 {
                    anyhow::bail!("bob keeps his name");
                }
                user.name = patch.name;
                Ok(user)
            }),
        )
        .build()
        .unwrap();
    let db = seeded().await;

    let request = RenameUsers {
        patches: vec![
            UserPatch {
                id: 1,
                name: "anna".into(),
            },
            UserPatch {
                id: 2,
                name: "bobby".into(),
            },
        ],
    };
    let response = engine
        .update_all(&request, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert!(response.has_error(ErrorKind::UpdateEntityFailed));
    assert_eq!(names(&db).await, vec!["ann", "bob", "cid"]);
}

#[tokio::test]
async fn test_failing_result_creator_writes_nothing() {
    let engine = builder()
        .profile(
            Profile::<CreateUser, User>::new().result_creator(|user: &User| -> anyhow::Result<UserDto> {
                anyhow::bail!("cannot describe {}", user.name)
            }),
        )
        .build()
        .unwrap();
    let db = seeded().await;

    let request = CreateUser {
        user: NewUser::new(10, "dora"),
    };
    let response = engine
        .create(&request, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert!(response.has_error(ErrorKind::CreateResultFailed));
    assert_eq!(names(&db).await, vec!["ann", "bob", "cid"]);
}

struct QuietErrors;

impl ErrorHandler for QuietErrors {
    fn handle(&self, _error: CrudError) -> Result<Vec<ResponseError>, CrudError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_empty_error_list_falls_back_to_classified_error() {
    let engine = builder()
        .profile(Profile::<GetUser, User>::new().error_handler(QuietErrors))
        .build()
        .unwrap();
    let db = seeded().await;

    let response = engine
        .get(&GetUser { id: 50 }, &db.context(), &RequestContext::new())
        .await
        .unwrap();

    assert!(response.data.is_none());
    assert_eq!(response.errors.len(), 1);
    assert!(response.has_error(ErrorKind::FailedToFind));
}
