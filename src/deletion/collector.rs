use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::core::error::Result;
use crate::database::Database;
use crate::db::record::value_key;
use crate::db::{Filter, Record, Select};
use crate::schema::{ModelMeta, OnDelete};


/// A dependent row found while walking foreign keys.
#[derive(Debug, Clone)]
pub struct Collected {
    pub meta: Arc<ModelMeta>,
    pub record: Record,
}

/// Rows pointing at `pk` through foreign keys, read straight from the store (soft deleted rows included).
pub(crate) async fn referencing_rows(
    db: &Database,
    meta: &ModelMeta,
    pk: &Value,
) -> Result<Vec<(Arc<ModelMeta>, OnDelete, String, Record)>> {
    let mut out = Vec::new();
    for (child, fk) in db.dependents(&meta.table) {
        let rows = db
            .store()
            .select(&child.table, &Select::new(Filter::Eq(fk.field.clone(), pk.clone())))
            .await?;
        for row in rows {
            out.push((Arc::clone(&child), fk.on_delete, fk.field.clone(), row));
        }
    }
    Ok(out)
}

/// Every row transitively reachable from `record` through `CASCADE` foreign keys, root excluded.
pub async fn cascade_related(db: &Database, meta: &Arc<ModelMeta>, record: &Record) -> Result<Vec<Collected>> {
    let root_pk = meta.pk_of(record)?;
    let mut seen: HashSet<(String, String)> = HashSet::new();
    seen.insert((meta.table.clone(), value_key(&root_pk)));

    let mut queue: VecDeque<(Arc<ModelMeta>, Value)> = VecDeque::new();
    queue.push_back((Arc::clone(meta), root_pk));

    let mut collected = Vec::new();
    while let Some((current, pk)) = queue.pop_front() {
        for (child, on_delete, _, row) in referencing_rows(db, &current, &pk).await? {
            if on_delete != OnDelete::Cascade {
                continue;
            }
            let child_pk = child.pk_of(&row)?;
            if !seen.insert((child.table.clone(), value_key(&child_pk))) {
                continue;
            }
            queue.push_back((Arc::clone(&child), child_pk));
            collected.push(Collected { meta: child, record: row });
        }
    }

    debug!(
        "Collected {} cascading dependents for {} {}",
        collected.len(),
        meta.table,
        record.get(&meta.pk_field).map(value_key).unwrap_or_default()
    );
    Ok(collected)
}

/// True when removing the row would leave every other row untouched.
///
/// Any referencing row blocks it, except through `DO_NOTHING` keys.
pub async fn can_hard_delete(db: &Database, meta: &ModelMeta, record: &Record) -> Result<bool> {
    let pk = meta.pk_of(record)?;
    let blocking = referencing_rows(db, meta, &pk)
        .await?
        .into_iter()
        .any(|(_, on_delete, _, _)| on_delete != OnDelete::DoNothing);
    Ok(!blocking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deletion::DeletePolicy;
    use serde_json::json;

    fn rec(v: Value) -> Record {
        v.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_cascade_related_follows_only_cascade_keys() {
        let db = Database::in_memory();
        let shelf = db.register(ModelMeta::new("shelf")).await.unwrap();
        db.register(ModelMeta::new("book").foreign_key("shelf_id", "shelf", OnDelete::Cascade))
            .await
            .unwrap();
        db.register(ModelMeta::new("page").foreign_key("book_id", "book", OnDelete::Cascade))
            .await
            .unwrap();
        db.register(
            ModelMeta::new("label")
                .policy(DeletePolicy::HardDelete)
                .foreign_key("shelf_id", "shelf", OnDelete::DoNothing),
        )
        .await
        .unwrap();

        let s = db.save("shelf", rec(json!({"name": "s"})), false).await.unwrap();
        let b = db.save("book", rec(json!({"shelf_id": s["id"]})), false).await.unwrap();
        db.save("page", rec(json!({"book_id": b["id"]})), false).await.unwrap();
        db.save("label", rec(json!({"shelf_id": s["id"]})), false).await.unwrap();

        let related = cascade_related(&db, &shelf, &s).await.unwrap();
        let tables: Vec<&str> = related.iter().map(|c| c.meta.table.as_str()).collect();
        assert_eq!(tables, vec!["book", "page"]);
        assert!(!can_hard_delete(&db, &shelf, &s).await.unwrap());

        let lonely = db.save("shelf", rec(json!({"name": "t"})), false).await.unwrap();
        db.save("label", rec(json!({"shelf_id": lonely["id"]})), false).await.unwrap();
        assert!(can_hard_delete(&db, &shelf, &lonely).await.unwrap());
    }
}
