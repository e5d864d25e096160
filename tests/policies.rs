mod common;

use std::sync::Arc;

use common::{blog, rec, tree};
use parking_lot::Mutex;
use safedelete::core::events::{EventHandler, POST_HARD_DELETE, POST_SOFTDELETE, POST_UNDELETE, PRE_SOFTDELETE};
use safedelete::{
    Database, DeletePolicy, DeletionOutcome, Filter, ModelMeta, OnDelete, SafeDeleteError,
};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_no_delete_is_rejected() {
    let db = blog().await;
    let objects = db.objects("very_important").unwrap();
    let row = objects.create(rec(json!({"name": "keep me"}))).await.unwrap();

    let err = db.delete("very_important", &row, None).await.unwrap_err();
    assert!(matches!(err, SafeDeleteError::PolicyViolation { .. }));

    assert_eq!(objects.count().await.unwrap(), 1);
    assert!(!db.is_deleted("very_important", &row).await.unwrap());

    // a forced policy still wins
    assert_ok!(db.delete("very_important", &row, Some(DeletePolicy::HardDelete)).await);
    assert_eq!(objects.all_with_deleted().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_soft_delete_and_undelete() {
    let db = blog().await;
    let categories = db.objects("category").unwrap();
    let category = categories.create(rec(json!({"name": "rust"}))).await.unwrap();

    let result = db.delete("category", &category, None).await.unwrap();
    assert_eq!(result.outcome, DeletionOutcome::SoftDeleted);
    assert_eq!(result.policy, DeletePolicy::SoftDelete);

    assert_eq!(categories.count().await.unwrap(), 0);
    assert_eq!(categories.deleted_only().count().await.unwrap(), 1);
    let stored = categories.all_with_deleted().first().await.unwrap().unwrap();
    assert!(stored["deleted"].is_string());

    let restored = db.undelete("category", &category, None).await.unwrap();
    assert_eq!(restored.related_restored, 0);
    assert_eq!(categories.count().await.unwrap(), 1);
    assert_eq!(categories.deleted_only().count().await.unwrap(), 0);

    // undeleting an alive row is an error
    let again = db.undelete("category", &category, None).await;
    assert!(matches!(again, Err(SafeDeleteError::NotDeleted { .. })));
}

#[tokio::test]
async fn test_save_revives_unless_kept_deleted() {
    let db = blog().await;
    let categories = db.objects("category").unwrap();
    let category = categories.create(rec(json!({"name": "rust"}))).await.unwrap();
    db.delete("category", &category, None).await.unwrap();

    let mut edited = db.refresh("category", &category).await.unwrap();
    edited.insert("name".to_string(), json!("rust 2"));
    db.save("category", edited.clone(), true).await.unwrap();
    assert!(db.is_deleted("category", &category).await.unwrap());

    db.save("category", edited, false).await.unwrap();
    assert!(!db.is_deleted("category", &category).await.unwrap());
    assert_eq!(categories.get(1).await.unwrap()["name"], json!("rust 2"));
}

#[tokio::test]
async fn test_soft_delete_cascade_and_undelete() {
    let db = tree().await;
    let parents = db.objects("parent").unwrap();
    let children = db.objects("child").unwrap();
    let grandchildren = db.objects("grandchild").unwrap();

    let parent = parents.create(rec(json!({"name": "p"}))).await.unwrap();
    for n in 0..2 {
        let child = children
            .create(rec(json!({"name": format!("c{n}"), "parent_id": parent["id"]})))
            .await
            .unwrap();
        grandchildren
            .create(rec(json!({"name": format!("g{n}"), "child_id": child["id"]})))
            .await
            .unwrap();
    }

    let result = db.delete("parent", &parent, None).await.unwrap();
    assert_eq!(result.related_affected, 4);
    assert_eq!(parents.count().await.unwrap(), 0);
    assert_eq!(children.count().await.unwrap(), 0);
    assert_eq!(grandchildren.count().await.unwrap(), 0);

    let parent_marker = parents.deleted_only().first().await.unwrap().unwrap()["deleted"].clone();
    for row in grandchildren.deleted_only().fetch().await.unwrap() {
        assert_eq!(row["deleted"], parent_marker);
    }

    let restored = db.undelete("parent", &parent, None).await.unwrap();
    assert_eq!(restored.related_restored, 4);
    assert_eq!(children.count().await.unwrap(), 2);
    assert_eq!(grandchildren.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_cascade_undelete_leaves_earlier_deletes_alone() {
    let db = tree().await;
    let parents = db.objects("parent").unwrap();
    let children = db.objects("child").unwrap();

    let parent = parents.create(rec(json!({"name": "p"}))).await.unwrap();
    let early = children
        .create(rec(json!({"name": "early", "parent_id": parent["id"]})))
        .await
        .unwrap();
    children
        .create(rec(json!({"name": "late", "parent_id": parent["id"]})))
        .await
        .unwrap();

    db.delete("child", &early, None).await.unwrap();
    let result = db.delete("parent", &parent, None).await.unwrap();
    assert_eq!(result.related_affected, 1);

    db.undelete("parent", &parent, None).await.unwrap();
    let alive = children.all().fetch().await.unwrap();
    assert_eq!(alive.len(), 1);
    assert_eq!(alive[0]["name"], json!("late"));
    assert!(db.is_deleted("child", &early).await.unwrap());
}

#[tokio::test]
async fn test_hard_delete_cascades() {
    let db = blog().await;
    let author = db.objects("author").unwrap().create(rec(json!({"name": "a"}))).await.unwrap();
    let category = db.objects("category").unwrap().create(rec(json!({"name": "c"}))).await.unwrap();
    let articles = db.objects("article").unwrap();
    let article = articles
        .create(rec(json!({"name": "x", "author_id": author["id"], "category_id": category["id"]})))
        .await
        .unwrap();

    let result = db.delete("article", &article, None).await.unwrap();
    assert_eq!(result.outcome, DeletionOutcome::HardDeleted);
    assert_eq!(articles.all_with_deleted().count().await.unwrap(), 0);

    let missing = db.delete("article", &article, None).await;
    assert!(matches!(missing, Err(SafeDeleteError::NotFound { .. })));

    // forcing a hard delete on the author removes the articles through CASCADE
    articles
        .create(rec(json!({"name": "y", "author_id": author["id"], "category_id": category["id"]})))
        .await
        .unwrap();
    let result = db
        .delete("author", &author, Some(DeletePolicy::HardDelete))
        .await
        .unwrap();
    assert_eq!(result.related_affected, 1);
    assert_eq!(articles.all_with_deleted().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_hard_delete_nocascade_falls_back() {
    let db = blog().await;
    let authors = db.objects("author").unwrap();
    let lonely = authors.create(rec(json!({"name": "lonely"}))).await.unwrap();
    let busy = authors.create(rec(json!({"name": "busy"}))).await.unwrap();
    let category = db.objects("category").unwrap().create(rec(json!({"name": "c"}))).await.unwrap();
    db.objects("article")
        .unwrap()
        .create(rec(json!({"name": "x", "author_id": busy["id"], "category_id": category["id"]})))
        .await
        .unwrap();

    let result = db.delete("author", &lonely, None).await.unwrap();
    assert_eq!(result.outcome, DeletionOutcome::HardDeleted);
    assert_eq!(result.policy, DeletePolicy::HardDelete);

    let result = db.delete("author", &busy, None).await.unwrap();
    assert_eq!(result.outcome, DeletionOutcome::SoftDeleted);
    assert_eq!(result.policy, DeletePolicy::SoftDelete);

    assert_eq!(authors.count().await.unwrap(), 0);
    assert_eq!(authors.all_with_deleted().count().await.unwrap(), 1);
    assert_eq!(db.objects("article").unwrap().count().await.unwrap(), 1);
}

async fn guarded() -> Database {
    let db = Database::in_memory();
    db.register(ModelMeta::new("owner").policy(DeletePolicy::HardDelete))
        .await
        .unwrap();
    db.register(
        ModelMeta::new("pet")
            .policy(DeletePolicy::HardDelete)
            .foreign_key("owner_id", "owner", OnDelete::SetNull),
    )
    .await
    .unwrap();
    db.register(
        ModelMeta::new("deed")
            .policy(DeletePolicy::HardDelete)
            .foreign_key("owner_id", "owner", OnDelete::Protect),
    )
    .await
    .unwrap();
    db.register(
        ModelMeta::new("note")
            .policy(DeletePolicy::HardDelete)
            .foreign_key("owner_id", "owner", OnDelete::DoNothing),
    )
    .await
    .unwrap();
    db
}

#[tokio::test]
async fn test_protect_blocks_hard_delete() {
    let db = guarded().await;
    let owner = db.objects("owner").unwrap().create(rec(json!({"name": "o"}))).await.unwrap();
    let pet = db
        .objects("pet")
        .unwrap()
        .create(rec(json!({"name": "rex", "owner_id": owner["id"]})))
        .await
        .unwrap();
    let deed = db
        .objects("deed")
        .unwrap()
        .create(rec(json!({"owner_id": owner["id"]})))
        .await
        .unwrap();

    let err = db.delete("owner", &owner, None).await.unwrap_err();
    match err {
        SafeDeleteError::Protected { table, referenced_by, .. } => {
            assert_eq!(table, "owner");
            assert_eq!(referenced_by, "deed.owner_id");
        }
        other => panic!("unexpected error: {other}"),
    }
    // nothing was written
    assert_eq!(db.refresh("pet", &pet).await.unwrap()["owner_id"], owner["id"]);
    assert_eq!(db.objects("owner").unwrap().count().await.unwrap(), 1);

    assert_ok!(db.delete("deed", &deed, None).await);
    assert_ok!(db.delete("owner", &owner, None).await);
}

#[tokio::test]
async fn test_set_null_and_do_nothing() {
    let db = guarded().await;
    let owner = db.objects("owner").unwrap().create(rec(json!({"name": "o"}))).await.unwrap();
    let pet = db
        .objects("pet")
        .unwrap()
        .create(rec(json!({"name": "rex", "owner_id": owner["id"]})))
        .await
        .unwrap();
    let note = db
        .objects("note")
        .unwrap()
        .create(rec(json!({"text": "hi", "owner_id": owner["id"]})))
        .await
        .unwrap();

    let result = db.delete("owner", &owner, None).await.unwrap();
    assert_eq!(result.related_affected, 1);

    assert!(db.refresh("pet", &pet).await.unwrap()["owner_id"].is_null());
    assert_eq!(db.refresh("note", &note).await.unwrap()["owner_id"], owner["id"]);
}

#[tokio::test]
async fn test_nocascade_ignores_do_nothing_references() {
    let db = guarded().await;
    db.register(
        ModelMeta::new("keeper")
            .policy(DeletePolicy::HardDeleteNocascade)
            .display("name"),
    )
    .await
    .unwrap();
    db.register(
        ModelMeta::new("memo")
            .policy(DeletePolicy::HardDelete)
            .foreign_key("keeper_id", "keeper", OnDelete::DoNothing),
    )
    .await
    .unwrap();

    let keeper = db.objects("keeper").unwrap().create(rec(json!({"name": "k"}))).await.unwrap();
    db.objects("memo")
        .unwrap()
        .create(rec(json!({"keeper_id": keeper["id"]})))
        .await
        .unwrap();

    let result = db.delete("keeper", &keeper, None).await.unwrap();
    assert_eq!(result.outcome, DeletionOutcome::HardDeleted);
}

#[tokio::test]
async fn test_signals_fire_in_order() {
    let db = tree().await;
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    for signal in [PRE_SOFTDELETE, POST_SOFTDELETE, POST_UNDELETE, POST_HARD_DELETE] {
        let seen = Arc::clone(&seen);
        let handler: EventHandler = Arc::new(move |event| {
            seen.lock().push(format!("{}:{}", event.event_type, event.table));
        });
        db.events().register(signal, handler).await;
    }

    let parent = db.objects("parent").unwrap().create(rec(json!({"name": "p"}))).await.unwrap();
    db.objects("child")
        .unwrap()
        .create(rec(json!({"parent_id": parent["id"]})))
        .await
        .unwrap();

    db.delete("parent", &parent, None).await.unwrap();
    assert_eq!(
        *seen.lock(),
        vec![
            "pre_softdelete:child",
            "post_softdelete:child",
            "pre_softdelete:parent",
            "post_softdelete:parent",
        ]
    );

    seen.lock().clear();
    db.undelete("parent", &parent, None).await.unwrap();
    assert_eq!(*seen.lock(), vec!["post_undelete:child", "post_undelete:parent"]);

    seen.lock().clear();
    db.delete("parent", &parent, Some(DeletePolicy::HardDelete)).await.unwrap();
    assert_eq!(
        *seen.lock(),
        vec!["post_hard_delete:child", "post_hard_delete:parent"]
    );
}

#[tokio::test]
async fn test_queryset_bulk_delete_and_undelete() {
    let db = tree().await;
    let parents = db.objects("parent").unwrap();
    let children = db.objects("child").unwrap();
    for n in 0..3 {
        let parent = parents.create(rec(json!({"name": format!("p{n}")}))).await.unwrap();
        children
            .create(rec(json!({"parent_id": parent["id"]})))
            .await
            .unwrap();
    }

    let results = parents
        .filter(Filter::ne("name", "p2"))
        .delete(None)
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(parents.count().await.unwrap(), 1);
    assert_eq!(children.count().await.unwrap(), 1);

    let restored = parents.deleted_only().undelete(None).await.unwrap();
    assert_eq!(restored.len(), 2);
    assert_eq!(parents.count().await.unwrap(), 3);
    assert_eq!(children.count().await.unwrap(), 3);

    // undeleting through an all-alive queryset reports nothing
    assert_err!(db.undelete("parent", &parents.all().first().await.unwrap().unwrap(), None).await);
    assert!(parents.all().undelete(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_queryset_update_respects_visibility() {
    let db = blog().await;
    let categories = db.objects("category").unwrap();
    for name in ["a", "b", "c"] {
        categories.create(rec(json!({"name": name}))).await.unwrap();
    }
    let b = categories.get(2).await.unwrap();
    db.delete("category", &b, None).await.unwrap();

    let changed = categories.all().update(&rec(json!({"color": "red"}))).await.unwrap();
    assert_eq!(changed, 2);
    let hidden = categories.deleted_only().first().await.unwrap().unwrap();
    assert!(hidden.get("color").is_none());
}
