//! Integration tests for the group service on in-memory SurrealDB.

use upms_admin::GroupService;
use upms_core::error::UpmsError;
use upms_core::models::group::{CreateGroup, UpdateGroup};
use upms_core::models::user::NewUser;
use upms_core::repository::UserRepository;
use upms_db::repository::{SurrealGroupRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Helper: group service plus three stored users.
async fn setup() -> (GroupService<SurrealGroupRepository<Db>>, Vec<Uuid>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    upms_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let mut ids = Vec::new();
    for name in ["alice", "bob", "carol"] {
        let user = users
            .create(NewUser {
                name: name.into(),
                password_hash: "0".repeat(64),
                salt: "s".repeat(32),
                owner_id: None,
                lock_ip: None,
            })
            .await
            .unwrap();
        ids.push(user.id);
    }

    (GroupService::new(SurrealGroupRepository::new(db)), ids)
}

fn group(name: &str, owner_id: Uuid) -> CreateGroup {
    CreateGroup {
        name: name.into(),
        description: String::new(),
        owner_id,
    }
}

#[tokio::test]
async fn owner_holds_one_group() {
    let (groups, users) = setup().await;
    groups.create(group("eng", users[0])).await.unwrap();

    let err = groups.create(group("ops", users[0])).await.unwrap_err();
    assert!(matches!(err, UpmsError::DuplicateKey { .. }));

    let owned = groups.find_by_owner(users[0]).await.unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].name, "eng");
}

#[tokio::test]
async fn membership_is_idempotent_and_removable() {
    let (groups, users) = setup().await;
    let eng = groups.create(group("eng", users[0])).await.unwrap();

    assert!(groups.add_member(eng.id, users[1]).await.unwrap());
    assert!(!groups.add_member(eng.id, users[1]).await.unwrap());
    assert_eq!(groups.load_members(eng.id).await.unwrap().len(), 1);

    let found = groups.find_by_member(users[1]).await.unwrap().unwrap();
    assert_eq!(found.id, eng.id);

    groups.remove_member(eng.id, users[1]).await.unwrap();
    groups.remove_member(eng.id, users[1]).await.unwrap();
    assert!(groups.load_members(eng.id).await.unwrap().is_empty());
    assert!(groups.find_by_member(users[1]).await.unwrap().is_none());
}

#[tokio::test]
async fn find_by_member_prefers_the_oldest_group() {
    let (groups, users) = setup().await;
    let first = groups.create(group("first", users[0])).await.unwrap();
    let second = groups.create(group("second", users[1])).await.unwrap();

    groups.add_member(second.id, users[2]).await.unwrap();
    // Second membership is allowed but logged.
    groups.add_member(first.id, users[2]).await.unwrap();

    let found = groups.find_by_member(users[2]).await.unwrap().unwrap();
    assert_eq!(found.id, first.id);
}

#[tokio::test]
async fn admins_and_admin_lookup() {
    let (groups, users) = setup().await;
    let eng = groups.create(group("eng", users[0])).await.unwrap();

    assert!(groups.add_admin(eng.id, users[1]).await.unwrap());
    assert!(groups.add_admin(eng.id, users[2]).await.unwrap());
    assert!(!groups.add_admin(eng.id, users[2]).await.unwrap());

    assert_eq!(groups.load_admins(eng.id).await.unwrap().len(), 2);
    assert_eq!(groups.find_by_admin(users[1]).await.unwrap().len(), 1);
    assert!(groups.find_by_admin(users[0]).await.unwrap().is_empty());

    groups.remove_admin(eng.id, users[1]).await.unwrap();
    assert_eq!(groups.load_admins(eng.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_group_or_user_is_not_found() {
    let (groups, users) = setup().await;
    let err = groups.add_member(Uuid::new_v4(), users[0]).await.unwrap_err();
    assert!(matches!(err, UpmsError::NotFound { .. }));

    let eng = groups.create(group("eng", users[0])).await.unwrap();
    let err = groups.add_admin(eng.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, UpmsError::NotFound { .. }));
}

#[tokio::test]
async fn disabled_groups_leave_the_active_list() {
    let (groups, users) = setup().await;
    let eng = groups.create(group("eng", users[0])).await.unwrap();
    assert_eq!(groups.list_active().await.unwrap().len(), 1);

    let updated = groups
        .update(
            eng.id,
            UpdateGroup {
                status: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!updated.is_active());
    assert!(groups.list_active().await.unwrap().is_empty());
    assert!(groups.find_by_owner(users[0]).await.unwrap().is_empty());
    assert!(groups.get_by_id(eng.id).await.unwrap().is_some());
}
