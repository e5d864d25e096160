use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::collector::referencing_rows;
use crate::core::error::{Result, SafeDeleteError};
use crate::core::events::{Event, POST_HARD_DELETE};
use crate::database::Database;
use crate::db::record::value_key;
use crate::db::{Filter, Record};
use crate::schema::{ModelMeta, OnDelete};


struct Protection {
    table: String,
    pk: Value,
    referenced_by: String,
    row_key: (String, String),
}

#[derive(Default)]
struct Plan {
    /// Root first, dependents in discovery order.
    deletions: Vec<(Arc<ModelMeta>, Record)>,
    deleting: HashSet<(String, String)>,
    nullify: Vec<(Arc<ModelMeta>, String, Value)>,
    protected: Vec<Protection>,
}

async fn collect(db: &Database, meta: &Arc<ModelMeta>, record: &Record) -> Result<Plan> {
    let mut plan = Plan::default();
    let root_pk = meta.pk_of(record)?;
    plan.deleting.insert((meta.table.clone(), value_key(&root_pk)));
    plan.deletions.push((Arc::clone(meta), record.clone()));

    let mut queue: VecDeque<(Arc<ModelMeta>, Value)> = VecDeque::new();
    queue.push_back((Arc::clone(meta), root_pk));

    while let Some((current, pk)) = queue.pop_front() {
        for (child, on_delete, field, row) in referencing_rows(db, &current, &pk).await? {
            let child_pk = child.pk_of(&row)?;
            let key = (child.table.clone(), value_key(&child_pk));
            match on_delete {
                OnDelete::Cascade => {
                    if plan.deleting.insert(key) {
                        queue.push_back((Arc::clone(&child), child_pk));
                        plan.deletions.push((child, row));
                    }
                }
                OnDelete::SetNull => plan.nullify.push((child, field, child_pk)),
                OnDelete::Protect => plan.protected.push(Protection {
                    table: current.table.clone(),
                    pk: pk.clone(),
                    referenced_by: format!("{}.{}", child.table, field),
                    row_key: key,
                }),
                OnDelete::DoNothing => {}
            }
        }
    }
    Ok(plan)
}

/// Physically removes `record` and applies `on_delete` to everything referencing it.
///
/// Nothing is written when a `PROTECT` key blocks the delete. Returns the number of
/// dependent rows removed or nulled.
pub async fn hard_delete(db: &Database, meta: &Arc<ModelMeta>, record: &Record) -> Result<usize> {
    let pk = meta.pk_of(record)?;
    warn!("HARD DELETE requested for {} {} - this is irreversible", meta.table, value_key(&pk));

    let plan = collect(db, meta, record).await?;

    if let Some(blocker) = plan
        .protected
        .iter()
        .find(|p| !plan.deleting.contains(&p.row_key))
    {
        warn!(
            "Hard delete of {} {} blocked by {}",
            blocker.table,
            value_key(&blocker.pk),
            blocker.referenced_by
        );
        return Err(SafeDeleteError::Protected {
            table: blocker.table.clone(),
            pk: value_key(&blocker.pk),
            referenced_by: blocker.referenced_by.clone(),
        });
    }

    let mut affected = 0;
    for (child, field, child_pk) in &plan.nullify {
        if plan.deleting.contains(&(child.table.clone(), value_key(child_pk))) {
            continue;
        }
        let mut values = Map::new();
        values.insert(field.clone(), Value::Null);
        affected += db
            .store()
            .update(&child.table, &Filter::Eq(child.pk_field.clone(), child_pk.clone()), &values)
            .await?;
        debug!("Set {}.{} to NULL on {}", child.table, field, value_key(child_pk));
    }

    for (i, (target, row)) in plan.deletions.iter().enumerate().rev() {
        let target_pk = target.pk_of(row)?;
        let removed = db
            .store()
            .delete(&target.table, &Filter::Eq(target.pk_field.clone(), target_pk.clone()))
            .await?;
        if i > 0 {
            affected += removed;
        }
        db.events()
            .emit(Event::new(POST_HARD_DELETE, &target.table, target_pk, row.clone()))
            .await;
    }

    info!(
        "Hard deleted {} {} ({} dependents affected)",
        meta.table,
        value_key(&pk),
        affected
    );
    Ok(affected)
}
