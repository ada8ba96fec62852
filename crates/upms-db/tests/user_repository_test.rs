//! Integration tests for User repository using in-memory SurrealDB.

use upms_core::error::UpmsError;
use upms_core::models::resource::CreateResource;
use upms_core::models::role::CreateRole;
use upms_core::models::user::{NewUser, UpdateUser};
use upms_core::repository::{ResourceRepository, RoleRepository, UserRepository};
use upms_db::repository::{
    SurrealResourceRepository, SurrealRoleRepository, SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    upms_db::run_migrations(&db).await.unwrap();
    db
}

fn new_user(name: &str, owner_id: Option<Uuid>) -> NewUser {
    NewUser {
        name: name.into(),
        password_hash: "ab".repeat(32),
        salt: "s".repeat(32),
        owner_id,
        lock_ip: None,
    }
}

#[tokio::test]
async fn create_and_lookup_user() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo
        .create(NewUser {
            lock_ip: Some("10.0.0.1".into()),
            ..new_user("alice", None)
        })
        .await
        .unwrap();
    assert!(user.is_top_level());
    assert!(!user.locked);
    assert!(user.code.is_none());

    let by_id = repo.get_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.name, "alice");
    assert_eq!(by_id.salt, "s".repeat(32));
    assert_eq!(by_id.lock_ip.as_deref(), Some("10.0.0.1"));

    let by_name = repo.get_by_name("alice").await.unwrap().unwrap();
    assert_eq!(by_name.id, user.id);

    assert!(repo.get_by_name("nobody").await.unwrap().is_none());
    assert!(repo.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_name_is_rejected() {
    let repo = SurrealUserRepository::new(setup().await);
    repo.create(new_user("alice", None)).await.unwrap();

    let err = repo.create(new_user("alice", None)).await.unwrap_err();
    assert!(matches!(err, UpmsError::DuplicateKey { ref entity, .. } if entity == "user"));
}

#[tokio::test]
async fn update_sets_and_clears_optional_columns() {
    let repo = SurrealUserRepository::new(setup().await);
    let user = repo.create(new_user("alice", None)).await.unwrap();

    let updated = repo
        .update(
            user.id,
            UpdateUser {
                code: Some(Some("abc".into())),
                locked: Some(true),
                lock_ip: Some(Some("10.0.0.2".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.code.as_deref(), Some("abc"));
    assert!(updated.locked);
    assert_eq!(updated.lock_ip.as_deref(), Some("10.0.0.2"));
    assert_eq!(updated.password_hash, user.password_hash);

    let cleared = repo
        .update(
            user.id,
            UpdateUser {
                lock_ip: Some(None),
                locked: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(cleared.lock_ip.is_none());
    assert!(!cleared.locked);
    assert_eq!(cleared.code.as_deref(), Some("abc"));
}

#[tokio::test]
async fn list_by_owner_returns_sub_users() {
    let repo = SurrealUserRepository::new(setup().await);
    let alice = repo.create(new_user("alice", None)).await.unwrap();
    repo.create(new_user("bob", Some(alice.id))).await.unwrap();
    repo.create(new_user("carol", Some(alice.id))).await.unwrap();
    repo.create(new_user("dave", None)).await.unwrap();

    let subs = repo.list_by_owner(alice.id).await.unwrap();
    let names: Vec<&str> = subs.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"bob"));
    assert!(names.contains(&"carol"));
    assert!(subs.iter().all(|u| u.owner_id == Some(alice.id)));
}

#[tokio::test]
async fn roles_can_be_added_replaced_and_removed() {
    let db = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db);

    let user = users.create(new_user("alice", None)).await.unwrap();
    let mut role_ids = Vec::new();
    for name in ["viewer", "editor", "admin"] {
        let role = roles
            .create(CreateRole {
                name: name.into(),
                ..Default::default()
            })
            .await
            .unwrap();
        role_ids.push(role.id);
    }

    assert!(users.add_role(user.id, role_ids[0]).await.unwrap());
    assert!(!users.add_role(user.id, role_ids[0]).await.unwrap());

    users
        .replace_roles(user.id, &[role_ids[1], role_ids[2]])
        .await
        .unwrap();
    let held: Vec<Uuid> = users
        .get_roles(user.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(held.len(), 2);
    assert!(!held.contains(&role_ids[0]));

    users.remove_role(user.id, role_ids[1]).await.unwrap();
    let held = users.get_roles(user.id).await.unwrap();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].id, role_ids[2]);
}

#[tokio::test]
async fn resource_overrides_are_independent_of_roles() {
    let db = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let resources = SurrealResourceRepository::new(db);

    let user = users.create(new_user("alice", None)).await.unwrap();
    let r1 = resources
        .create(CreateResource {
            name: "reports".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let r2 = resources
        .create(CreateResource {
            name: "billing".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(users.add_resource(user.id, r1.id).await.unwrap());
    users.replace_resources(user.id, &[r2.id]).await.unwrap();

    let held = users.get_resources(user.id).await.unwrap();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].id, r2.id);
    assert!(users.get_roles(user.id).await.unwrap().is_empty());

    users.remove_resource(user.id, r2.id).await.unwrap();
    assert!(users.get_resources(user.id).await.unwrap().is_empty());
}
