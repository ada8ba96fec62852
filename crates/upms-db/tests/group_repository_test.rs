//! Integration tests for Group repository using in-memory SurrealDB.

use upms_core::error::UpmsError;
use upms_core::models::group::{CreateGroup, UpdateGroup};
use upms_core::models::user::NewUser;
use upms_core::repository::{GroupRepository, UserRepository};
use upms_db::repository::{SurrealGroupRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

fn new_user(name: &str) -> NewUser {
    NewUser {
        name: name.into(),
        password_hash: "0".repeat(64),
        salt: "s".repeat(32),
        owner_id: None,
        lock_ip: None,
    }
}

/// Helper: spin up in-memory DB, run migrations, create 2 users.
async fn setup() -> (
    Surreal<surrealdb::engine::local::Db>,
    Uuid, // user_a_id
    Uuid, // user_b_id
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    upms_db::run_migrations(&db).await.unwrap();

    let user_repo = SurrealUserRepository::new(db.clone());
    let user_a = user_repo.create(new_user("alice")).await.unwrap();
    let user_b = user_repo.create(new_user("bob")).await.unwrap();

    (db, user_a.id, user_b.id)
}

fn group_for(owner_id: Uuid, name: &str) -> CreateGroup {
    CreateGroup {
        name: name.into(),
        description: format!("{name} team"),
        owner_id,
    }
}

#[tokio::test]
async fn create_and_get_group() {
    let (db, alice, _) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    let group = repo.create(group_for(alice, "Engineering")).await.unwrap();
    assert_eq!(group.owner_id, alice);
    assert!(group.is_active());

    let fetched = repo.get_by_id(group.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Engineering");
    assert_eq!(fetched.description, "Engineering team");

    assert!(repo.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn one_group_per_owner() {
    let (db, alice, bob) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    repo.create(group_for(alice, "Engineering")).await.unwrap();

    let err = repo.create(group_for(alice, "Sales")).await.unwrap_err();
    assert!(matches!(err, UpmsError::DuplicateKey { ref field, .. } if field == "owner_id"));

    let err = repo.create(group_for(bob, "Engineering")).await.unwrap_err();
    assert!(matches!(err, UpmsError::DuplicateKey { ref field, .. } if field == "name"));
}

#[tokio::test]
async fn update_and_filter_by_status() {
    let (db, alice, _) = setup().await;
    let repo = SurrealGroupRepository::new(db);
    let group = repo.create(group_for(alice, "Engineering")).await.unwrap();

    let updated = repo
        .update(
            group.id,
            UpdateGroup {
                status: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, 1);
    assert_eq!(updated.name, "Engineering");

    assert!(repo.list_by_status(0).await.unwrap().is_empty());
    assert!(repo.list_by_owner(alice, 0).await.unwrap().is_empty());
    assert_eq!(repo.list_by_owner(alice, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn add_and_remove_members() {
    let (db, alice, bob) = setup().await;
    let repo = SurrealGroupRepository::new(db);
    let group = repo.create(group_for(alice, "Engineering")).await.unwrap();

    assert!(repo.add_member(group.id, alice).await.unwrap());
    assert!(repo.add_member(group.id, bob).await.unwrap());
    assert!(!repo.add_member(group.id, bob).await.unwrap());

    let members = repo.get_members(group.id).await.unwrap();
    assert_eq!(members.len(), 2);

    let groups = repo.get_member_groups(bob).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, group.id);

    repo.remove_member(group.id, bob).await.unwrap();
    // Removing again is a no-op.
    repo.remove_member(group.id, bob).await.unwrap();

    let members = repo.get_members(group.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].name, "alice");
    assert!(repo.get_member_groups(bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn admins_are_tracked_separately() {
    let (db, alice, bob) = setup().await;
    let repo = SurrealGroupRepository::new(db);
    let group = repo.create(group_for(alice, "Engineering")).await.unwrap();

    assert!(repo.add_admin(group.id, bob).await.unwrap());
    assert!(repo.get_members(group.id).await.unwrap().is_empty());

    let admins = repo.get_admins(group.id).await.unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].id, bob);
    assert_eq!(repo.get_admin_groups(bob).await.unwrap().len(), 1);

    repo.remove_admin(group.id, bob).await.unwrap();
    assert!(repo.get_admins(group.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn add_member_to_missing_group_is_not_found() {
    let (db, alice, _) = setup().await;
    let repo = SurrealGroupRepository::new(db);

    let err = repo.add_member(Uuid::new_v4(), alice).await.unwrap_err();
    assert!(matches!(err, UpmsError::NotFound { ref entity, .. } if entity == "group"));

    let group = repo.create(group_for(alice, "Engineering")).await.unwrap();
    let err = repo.add_member(group.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, UpmsError::NotFound { ref entity, .. } if entity == "user"));
}
