//! Integration tests for the resource tree service on in-memory SurrealDB.

use upms_admin::ResourceService;
use upms_core::error::UpmsError;
use upms_core::models::resource::{CreateResource, ResourceField, UpdateResource};
use upms_core::repository::ResourceRepository;
use upms_db::repository::SurrealResourceRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> ResourceService<SurrealResourceRepository<Db>> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    upms_db::run_migrations(&db).await.unwrap();
    ResourceService::new(SurrealResourceRepository::new(db))
}

fn node(name: &str, sort_order: u32, parent_id: Option<Uuid>) -> CreateResource {
    CreateResource {
        name: name.into(),
        class: "menu".into(),
        resource_type: 1,
        sort_order,
        parent_id,
        ..Default::default()
    }
}

#[tokio::test]
async fn create_with_unknown_parent_is_invalid_reference() {
    let service = setup().await;
    let err = service
        .create(node("orphan", 0, Some(Uuid::new_v4())))
        .await
        .unwrap_err();
    assert!(matches!(err, UpmsError::InvalidReference { .. }));
}

#[tokio::test]
async fn create_with_blank_name_is_rejected() {
    let service = setup().await;
    let err = service.create(node("  ", 0, None)).await.unwrap_err();
    assert!(matches!(err, UpmsError::Validation { .. }));
}

#[tokio::test]
async fn load_children_on_leaf_is_empty() {
    let service = setup().await;
    let leaf = service.create(node("leaf", 0, None)).await.unwrap();
    assert!(service.load_children(leaf.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn add_child_rejects_cycles() {
    let service = setup().await;
    let root = service.create(node("root", 0, None)).await.unwrap();
    let mid = service.create(node("mid", 0, Some(root.id))).await.unwrap();
    let leaf = service.create(node("leaf", 0, Some(mid.id))).await.unwrap();

    let err = service.add_child(root.id, root.id).await.unwrap_err();
    assert!(matches!(err, UpmsError::CycleDetected(_)));

    // root is an ancestor of leaf, so it cannot become leaf's child.
    let err = service.add_child(leaf.id, root.id).await.unwrap_err();
    assert!(matches!(err, UpmsError::CycleDetected(_)));

    // The tree is unchanged.
    assert!(service.get_by_id(root.id).await.unwrap().unwrap().parent_id.is_none());
}

#[tokio::test]
async fn add_child_moves_between_parents() {
    let service = setup().await;
    let a = service.create(node("a", 0, None)).await.unwrap();
    let b = service.create(node("b", 1, None)).await.unwrap();
    let child = service.create(node("child", 0, Some(a.id))).await.unwrap();

    service.add_child(b.id, child.id).await.unwrap();

    assert!(service.load_children(a.id).await.unwrap().is_empty());
    let under_b = service.load_children(b.id).await.unwrap();
    assert_eq!(under_b.len(), 1);
    assert_eq!(under_b[0].id, child.id);
}

#[tokio::test]
async fn add_missing_child_is_not_found() {
    let service = setup().await;
    let root = service.create(node("root", 0, None)).await.unwrap();
    let err = service.add_child(root.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, UpmsError::NotFound { .. }));
}

#[tokio::test]
async fn remove_child_only_detaches_from_current_parent() {
    let service = setup().await;
    let a = service.create(node("a", 0, None)).await.unwrap();
    let b = service.create(node("b", 1, None)).await.unwrap();
    let child = service.create(node("child", 0, Some(a.id))).await.unwrap();

    service.remove_child(b.id, child.id).await.unwrap();
    assert_eq!(service.load_children(a.id).await.unwrap().len(), 1);

    service.remove_child(a.id, child.id).await.unwrap();
    assert!(service.load_children(a.id).await.unwrap().is_empty());
    assert!(service.get_by_id(child.id).await.unwrap().is_some());
}

#[tokio::test]
async fn clear_children_keeps_the_children() {
    let service = setup().await;
    let root = service.create(node("root", 0, None)).await.unwrap();
    let c1 = service.create(node("c1", 0, Some(root.id))).await.unwrap();
    let c2 = service.create(node("c2", 1, Some(root.id))).await.unwrap();

    service.clear_children(root.id).await.unwrap();

    assert!(service.load_children(root.id).await.unwrap().is_empty());
    for id in [c1.id, c2.id] {
        let r = service.get_by_id(id).await.unwrap().unwrap();
        assert!(r.parent_id.is_none());
    }
}

#[tokio::test]
async fn ancestors_are_nearest_first() {
    let service = setup().await;
    let root = service.create(node("root", 0, None)).await.unwrap();
    let mid = service.create(node("mid", 0, Some(root.id))).await.unwrap();
    let leaf = service.create(node("leaf", 0, Some(mid.id))).await.unwrap();

    let chain: Vec<Uuid> = service
        .ancestors(leaf.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(chain, vec![mid.id, root.id]);
    assert!(service.ancestors(root.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn deep_chains_attach_without_a_false_cycle() {
    let service = setup().await;
    let root = service.create(node("n0", 0, None)).await.unwrap();
    let mut deepest = root.id;
    for level in 1..60 {
        deepest = service
            .create(node(&format!("n{level}"), 0, Some(deepest)))
            .await
            .unwrap()
            .id;
    }
    let leaf = service.create(node("leaf", 0, None)).await.unwrap();

    service.add_child(deepest, leaf.id).await.unwrap();

    let chain = service.ancestors(leaf.id).await.unwrap();
    assert_eq!(chain.len(), 60);
    assert_eq!(chain[0].id, deepest);
    assert_eq!(chain[59].id, root.id);

    // The top of the chain still cannot move under its own descendant.
    let err = service.add_child(leaf.id, root.id).await.unwrap_err();
    assert!(matches!(err, UpmsError::CycleDetected(_)));
    assert_eq!(service.load_subtree(root.id).await.unwrap().len(), 61);
}

#[tokio::test]
async fn ancestors_report_a_stored_parent_loop() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    upms_db::run_migrations(&db).await.unwrap();
    let repo = SurrealResourceRepository::new(db);
    let service = ResourceService::new(repo.clone());

    let a = service.create(node("a", 0, None)).await.unwrap();
    let b = service.create(node("b", 0, Some(a.id))).await.unwrap();
    // Written straight to storage, bypassing the service's cycle check.
    repo.attach_child(b.id, a.id).await.unwrap();

    let err = service.ancestors(b.id).await.unwrap_err();
    assert!(matches!(err, UpmsError::CycleDetected(_)), "got: {err:?}");
}

#[tokio::test]
async fn load_subtree_initialises_every_node() {
    let service = setup().await;
    let root = service.create(node("root", 0, None)).await.unwrap();
    let second = service.create(node("second", 2, Some(root.id))).await.unwrap();
    let first = service.create(node("first", 1, Some(root.id))).await.unwrap();
    let deep = service.create(node("deep", 0, Some(first.id))).await.unwrap();
    service.create(node("elsewhere", 0, None)).await.unwrap();

    let tree = service.load_subtree(root.id).await.unwrap();
    assert_eq!(tree.len(), 4);
    assert_eq!(tree.children.len(), 2);
    assert_eq!(tree.children[0].id(), first.id);
    assert_eq!(tree.children[1].id(), second.id);
    assert_eq!(tree.children[0].children[0].id(), deep.id);
    assert!(tree.find(deep.id).unwrap().children.is_empty());
    assert!(tree.children[1].children.is_empty());
}

#[tokio::test]
async fn load_forest_skips_disabled_resources() {
    let service = setup().await;
    let a = service.create(node("a", 0, None)).await.unwrap();
    service.create(node("a1", 0, Some(a.id))).await.unwrap();
    let b = service.create(node("b", 1, None)).await.unwrap();
    service
        .update_field(b.id, ResourceField::Status(1))
        .await
        .unwrap();

    let forest = service.load_forest().await.unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].id(), a.id);
    assert_eq!(forest[0].children.len(), 1);
}

#[tokio::test]
async fn field_updates_persist() {
    let service = setup().await;
    let r = service.create(node("reports", 0, None)).await.unwrap();

    let renamed = service
        .update_field(r.id, ResourceField::Name("analytics".into()))
        .await
        .unwrap();
    assert_eq!(renamed.name, "analytics");
    assert_eq!(renamed.class, "menu");

    let updated = service
        .update_fields(
            r.id,
            UpdateResource {
                attr: Some("/analytics".into()),
                sort_order: Some(9),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.attr, "/analytics");
    assert_eq!(updated.sort_order, 9);
    assert_eq!(updated.name, "analytics");

    let err = service
        .update_fields(r.id, UpdateResource::default())
        .await
        .unwrap_err();
    assert!(matches!(err, UpmsError::Validation { .. }));
}

#[tokio::test]
async fn list_active_excludes_disabled() {
    let service = setup().await;
    service.create(node("on", 0, None)).await.unwrap();
    let off = service.create(node("off", 1, None)).await.unwrap();
    service
        .update_field(off.id, ResourceField::Status(2))
        .await
        .unwrap();

    let active = service.list_active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "on");
    assert_eq!(service.list_by_status(2).await.unwrap().len(), 1);
}
