#![allow(dead_code)]

use safedelete::{Database, DeletePolicy, ModelMeta, OnDelete, Record};
use serde_json::Value;

pub fn rec(value: Value) -> Record {
    value.as_object().expect("fixture must be an object").clone()
}

/// Models shaped like a small blog: authors hard delete only when nothing depends on them,
/// categories soft delete and keep unique names, articles hard delete.
pub async fn blog() -> Database {
    let db = Database::in_memory();
    db.register(
        ModelMeta::new("author")
            .policy(DeletePolicy::HardDeleteNocascade)
            .display("name"),
    )
    .await
    .unwrap();
    db.register(
        ModelMeta::new("category")
            .policy(DeletePolicy::SoftDelete)
            .unique("name")
            .display("name")
            .verbose_names("category", "categories"),
    )
    .await
    .unwrap();
    db.register(
        ModelMeta::new("article")
            .policy(DeletePolicy::HardDelete)
            .foreign_key("author_id", "author", OnDelete::Cascade)
            .foreign_key("category_id", "category", OnDelete::Cascade)
            .display("name"),
    )
    .await
    .unwrap();
    db.register(
        ModelMeta::new("very_important")
            .policy(DeletePolicy::NoDelete)
            .display("name"),
    )
    .await
    .unwrap();
    db
}

/// Parent/child/grandchild chain under cascading soft delete.
pub async fn tree() -> Database {
    let db = Database::in_memory();
    db.register(ModelMeta::new("parent").policy(DeletePolicy::SoftDeleteCascade))
        .await
        .unwrap();
    db.register(
        ModelMeta::new("child")
            .policy(DeletePolicy::SoftDelete)
            .foreign_key("parent_id", "parent", OnDelete::Cascade),
    )
    .await
    .unwrap();
    db.register(
        ModelMeta::new("grandchild")
            .policy(DeletePolicy::SoftDelete)
            .foreign_key("child_id", "child", OnDelete::Cascade),
    )
    .await
    .unwrap();
    db
}
