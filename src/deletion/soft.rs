use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::collector::cascade_related;
use super::models::{DeletePolicy, RestoreResult};
use crate::core::error::{Result, SafeDeleteError};
use crate::core::events::{Event, POST_SOFTDELETE, POST_UNDELETE, PRE_SOFTDELETE};
use crate::database::Database;
use crate::db::record::value_key;
use crate::db::{Filter, Record};
use crate::schema::ModelMeta;


async fn write_marker(db: &Database, meta: &ModelMeta, pk: &Value, marker: Value) -> Result<()> {
    let mut values = Map::new();
    values.insert(meta.marker_field().to_string(), marker);
    db.store()
        .update(&meta.table, &Filter::Eq(meta.pk_field.clone(), pk.clone()), &values)
        .await?;
    Ok(())
}

/// Sets the deleted marker on one row, surrounded by the soft delete signals.
pub async fn soft_delete(db: &Database, meta: &ModelMeta, record: &Record, marker: &Value) -> Result<Record> {
    let pk = meta.pk_of(record)?;
    let mut marked = record.clone();
    marked.insert(meta.marker_field().to_string(), marker.clone());

    db.events()
        .emit(Event::new(PRE_SOFTDELETE, &meta.table, pk.clone(), marked.clone()))
        .await;

    write_marker(db, meta, &pk, marker.clone()).await?;

    db.events()
        .emit(Event::new(POST_SOFTDELETE, &meta.table, pk.clone(), marked.clone()))
        .await;

    info!("Soft deleted {} {}", meta.table, value_key(&pk));
    Ok(marked)
}

/// Soft deletes every alive cascading dependent with the parent's marker, then the parent.
///
/// Returns the marked parent and the number of dependents marked.
pub async fn soft_delete_cascade(
    db: &Database,
    meta: &Arc<ModelMeta>,
    record: &Record,
    marker: &Value,
) -> Result<(Record, usize)> {
    let related = cascade_related(db, meta, record).await?;
    let mut affected = 0;
    for item in related {
        if item.meta.is_deleted(&item.record) {
            debug!("{} already deleted, leaving its marker alone", item.meta.table);
            continue;
        }
        soft_delete(db, &item.meta, &item.record, marker).await?;
        affected += 1;
    }

    let marked = soft_delete(db, meta, record, marker).await?;
    Ok((marked, affected))
}

/// Clears the deleted marker. Under `SOFT_DELETE_CASCADE`, dependents that carry the
/// same marker as the record are restored with it.
pub async fn undelete(
    db: &Database,
    meta: &Arc<ModelMeta>,
    record: &Record,
    force_policy: Option<DeletePolicy>,
) -> Result<RestoreResult> {
    let current = db.refresh(&meta.table, record).await?;
    let pk = meta.pk_of(&current)?;
    if !meta.is_deleted(&current) {
        warn!("Refusing to undelete alive {} {}", meta.table, value_key(&pk));
        return Err(SafeDeleteError::NotDeleted {
            table: meta.table.clone(),
            pk: value_key(&pk),
        });
    }

    let policy = force_policy.unwrap_or_else(|| meta.delete_policy());
    let marker = meta.marker_of(&current).clone();

    db.save(&meta.table, current.clone(), false).await?;

    let mut related_restored = 0;
    if policy == DeletePolicy::SoftDeleteCascade {
        for item in cascade_related(db, meta, &current).await? {
            if item.meta.marker_of(&item.record) != &marker {
                continue;
            }
            let child_pk = item.meta.pk_of(&item.record)?;
            write_marker(db, &item.meta, &child_pk, Value::Null).await?;

            let mut restored = item.record.clone();
            restored.insert(item.meta.marker_field().to_string(), Value::Null);
            db.events()
                .emit(Event::new(POST_UNDELETE, &item.meta.table, child_pk, restored))
                .await;
            related_restored += 1;
        }
    }

    let mut restored = current;
    restored.insert(meta.marker_field().to_string(), Value::Null);
    db.events()
        .emit(Event::new(POST_UNDELETE, &meta.table, pk.clone(), restored))
        .await;

    info!(
        "Restored {} {} ({} dependents)",
        meta.table,
        value_key(&pk),
        related_restored
    );
    Ok(RestoreResult {
        table: meta.table.clone(),
        pk,
        restored_at: Utc::now(),
        related_restored,
    })
}
