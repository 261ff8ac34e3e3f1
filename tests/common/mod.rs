//! Shared fixtures for the pipeline tests
#![allow(dead_code)]

use crudhaus::prelude::*;
use serde_json::json;

/// Implemented by every entity that keeps an audit trail
pub trait Tracked: Send + Sync {
    fn track(&mut self, note: &str);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Entity, Lineage)]
#[entity(table = "users")]
#[lineage(dyn Tracked)]
pub struct User {
    #[key]
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Tracked for User {
    fn track(&mut self, note: &str) {
        self.notes.push(note.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl NewUser {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name),
        }
    }
}

pub fn user_row(id: i64, name: &str, active: bool) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "email": format!("{}@example.com", name),
        "active": active,
        "notes": []
    })
}

/// Database holding ann (1, active), bob (2, inactive) and cid (3, active)
pub async fn seeded() -> InMemoryDatabase {
    let db = InMemoryDatabase::new();
    db.seed(
        "users",
        vec![
            user_row(1, "ann", true),
            user_row(2, "bob", false),
            user_row(3, "cid", true),
        ],
    )
    .await;
    db
}

pub async fn names(db: &InMemoryDatabase) -> Vec<String> {
    db.rows("users")
        .await
        .iter()
        .filter_map(|row| row["name"].as_str().map(str::to_string))
        .collect()
}

// Requests

#[derive(Debug, Clone, Serialize, Lineage)]
pub struct CreateUser {
    pub user: NewUser,
}

impl CrudRequest for CreateUser {
    const SHAPE: RequestShape = RequestShape::Create;
    type Entity = User;
    type Item = NewUser;
    type Output = UserDto;
}

impl ItemRequest for CreateUser {
    fn item(&self) -> NewUser {
        self.user.clone()
    }
}

#[derive(Debug, Clone, Serialize, Lineage)]
pub struct CreateUsers {
    pub users: Vec<NewUser>,
}

impl CrudRequest for CreateUsers {
    const SHAPE: RequestShape = RequestShape::CreateAll;
    type Entity = User;
    type Item = NewUser;
    type Output = UserDto;
}

impl ItemsRequest for CreateUsers {
    fn items(&self) -> Vec<NewUser> {
        self.users.clone()
    }
}

#[derive(Debug, Clone, Serialize, Lineage)]
pub struct GetUser {
    pub id: i64,
}

impl CrudRequest for GetUser {
    const SHAPE: RequestShape = RequestShape::Get;
    type Entity = User;
    type Item = ();
    type Output = UserDto;
}

#[derive(Debug, Clone, Default, Serialize, Lineage)]
pub struct ListUsers {
    pub active_only: bool,
    pub sort: Vec<(String, bool)>,
}

impl CrudRequest for ListUsers {
    const SHAPE: RequestShape = RequestShape::GetAll;
    type Entity = User;
    type Item = ();
    type Output = UserDto;
}

#[derive(Debug, Clone, Serialize, Lineage)]
pub struct PageUsers {
    pub page: u64,
    pub size: u64,
}

impl CrudRequest for PageUsers {
    const SHAPE: RequestShape = RequestShape::PagedGetAll;
    type Entity = User;
    type Item = ();
    type Output = UserDto;
}

impl PagedRequest for PageUsers {
    fn page_number(&self) -> u64 {
        self.page
    }

    fn page_size(&self) -> u64 {
        self.size
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPatch {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Lineage)]
pub struct RenameUser {
    pub patch: UserPatch,
}

impl CrudRequest for RenameUser {
    const SHAPE: RequestShape = RequestShape::Update;
    type Entity = User;
    type Item = UserPatch;
    type Output = UserDto;
}

impl ItemRequest for RenameUser {
    fn item(&self) -> UserPatch {
        self.patch.clone()
    }
}

#[derive(Debug, Clone, Serialize, Lineage)]
pub struct RenameUsers {
    pub patches: Vec<UserPatch>,
}

impl CrudRequest for RenameUsers {
    const SHAPE: RequestShape = RequestShape::UpdateAll;
    type Entity = User;
    type Item = UserPatch;
    type Output = UserDto;
}

impl ItemsRequest for RenameUsers {
    fn items(&self) -> Vec<UserPatch> {
        self.patches.clone()
    }
}

#[derive(Debug, Clone, Serialize, Lineage)]
pub struct DeleteUser {
    pub id: i64,
}

impl CrudRequest for DeleteUser {
    const SHAPE: RequestShape = RequestShape::Delete;
    type Entity = User;
    type Item = ();
    type Output = ();
}

#[derive(Debug, Clone, Serialize, Lineage)]
pub struct DeleteInactive;

impl CrudRequest for DeleteInactive {
    const SHAPE: RequestShape = RequestShape::DeleteAll;
    type Entity = User;
    type Item = ();
    type Output = UserDto;
}

#[derive(Debug, Clone, Serialize, Lineage)]
pub struct SaveUser {
    pub user: NewUser,
}

impl CrudRequest for SaveUser {
    const SHAPE: RequestShape = RequestShape::Save;
    type Entity = User;
    type Item = NewUser;
    type Output = UserDto;
}

impl ItemRequest for SaveUser {
    fn item(&self) -> NewUser {
        self.user.clone()
    }
}

#[derive(Debug, Clone, Serialize, Lineage)]
pub struct MergeUsers {
    pub users: Vec<NewUser>,
}

impl CrudRequest for MergeUsers {
    const SHAPE: RequestShape = RequestShape::Merge;
    type Entity = User;
    type Item = NewUser;
    type Output = UserDto;
}

impl ItemsRequest for MergeUsers {
    fn items(&self) -> Vec<NewUser> {
        self.users.clone()
    }
}

#[derive(Debug, Clone, Serialize, Lineage)]
pub struct SyncUsers {
    pub users: Vec<NewUser>,
}

impl CrudRequest for SyncUsers {
    const SHAPE: RequestShape = RequestShape::Synchronize;
    type Entity = User;
    type Item = NewUser;
    type Output = UserDto;
}

impl ItemsRequest for SyncUsers {
    fn items(&self) -> Vec<NewUser> {
        self.users.clone()
    }
}

pub fn new_user_key() -> Key<NewUser> {
    Key::new("id", |u: &NewUser| u.id)
}

pub fn patch_key() -> Key<UserPatch> {
    Key::new("id", |p: &UserPatch| p.id)
}

/// Engine wired for every request type above
pub fn builder() -> CrudhausBuilder {
    Crudhaus::builder()
        .profile(Profile::<CreateUser, User>::new())
        .profile(Profile::<GetUser, User>::new().request_key(Key::new("id", |r: &GetUser| r.id)))
        .profile(
            Profile::<ListUsers, User>::new()
                .filter_when(|r| r.active_only, |_, query| {
                    Ok(query.filter(QueryFilter::eq("active", serde_json::Value::Bool(true))))
                })
                .sorter(
                    TableSorter::new()
                        .column("name", "name")
                        .column("id", "id")
                        .control(|r: &ListUsers| control(r, 0))
                        .control(|r: &ListUsers| control(r, 1)),
                ),
        )
        .profile(Profile::<PageUsers, User>::new().sorter(
            BasicSorter::new().operation(SortOperation::ascending("name")),
        ))
        .profile(Profile::<RenameUser, User>::new().item_key(patch_key()))
        .profile(Profile::<RenameUsers, User>::new().item_key(patch_key()))
        .profile(Profile::<DeleteUser, User>::new().request_key(Key::new("id", |r: &DeleteUser| r.id)))
        .profile(Profile::<DeleteInactive, User>::new().select(|_| {
            QueryFilter::eq("active", serde_json::Value::Bool(false))
        }))
        .profile(Profile::<SaveUser, User>::new().item_key(new_user_key()))
        .profile(Profile::<MergeUsers, User>::new().item_key(new_user_key()))
        .profile(Profile::<SyncUsers, User>::new().item_key(new_user_key()))
        .handle::<CreateUser>()
        .handle::<CreateUsers>()
        .handle::<GetUser>()
        .handle::<ListUsers>()
        .handle::<PageUsers>()
        .handle::<RenameUser>()
        .handle::<RenameUsers>()
        .handle::<DeleteUser>()
        .handle::<DeleteInactive>()
        .handle::<SaveUser>()
        .handle::<MergeUsers>()
        .handle::<SyncUsers>()
}

fn control(request: &ListUsers, index: usize) -> Option<SortControl> {
    request.sort.get(index).map(|(token, ascending)| {
        let order = if *ascending {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        };
        SortControl::new(token.clone(), order)
    })
}
