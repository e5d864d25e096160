use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::collector::can_hard_delete;
use super::hard::hard_delete;
use super::models::{DeletePolicy, DeletionOutcome, DeletionResult};
use super::soft::{soft_delete, soft_delete_cascade};
use crate::core::error::{Result, SafeDeleteError};
use crate::database::Database;
use crate::db::record::{now_marker, value_key};
use crate::db::{Filter, Record, Select};
use crate::schema::ModelMeta;


/// Inserts or updates `record`. Unless `keep_deleted` is set, saving clears the deleted marker.
pub async fn save(db: &Database, meta: &ModelMeta, mut record: Record, keep_deleted: bool) -> Result<Record> {
    if !keep_deleted {
        record.insert(meta.marker_field().to_string(), Value::Null);
    }

    if let Ok(pk) = meta.pk_of(&record) {
        let by_pk = Filter::Eq(meta.pk_field.clone(), pk.clone());
        if db.store().count(&meta.table, &by_pk).await? > 0 {
            db.store().update(&meta.table, &by_pk, &record).await?;
            debug!("Updated {} {}", meta.table, value_key(&pk));
            return Ok(record);
        }
    }

    let stored = db.store().insert(&meta.table, record).await?;
    debug!(
        "Inserted {} {}",
        meta.table,
        stored.get(&meta.pk_field).map(value_key).unwrap_or_default()
    );
    Ok(stored)
}

/// Reloads the stored row behind `record`, whatever its deleted state.
pub async fn refresh(db: &Database, meta: &ModelMeta, record: &Record) -> Result<Record> {
    let pk = meta.pk_of(record)?;
    let lookup = Filter::Eq(meta.pk_field.clone(), pk);
    let mut select = Select::new(lookup.clone());
    select.limit = Some(1);
    db.store()
        .select(&meta.table, &select)
        .await?
        .pop()
        .ok_or_else(|| SafeDeleteError::NotFound {
            table: meta.table.clone(),
            lookup: lookup.to_string(),
        })
}

/// Checks every unique field against all stored rows, soft deleted ones included.
pub async fn validate_unique(db: &Database, meta: &ModelMeta, record: &Record) -> Result<()> {
    let own_pk = meta.pk_of(record).ok();
    for field in &meta.unique_fields {
        let value = match record.get(field) {
            Some(Value::Null) | None => continue,
            Some(v) => v,
        };
        let mut clash = Filter::Eq(field.clone(), value.clone());
        if let Some(pk) = &own_pk {
            clash = clash.and(Filter::Ne(meta.pk_field.clone(), pk.clone()));
        }
        if db.store().count(&meta.table, &clash).await? > 0 {
            return Err(SafeDeleteError::Validation {
                table: meta.table.clone(),
                field: field.clone(),
                value: value_key(value),
            });
        }
    }
    Ok(())
}

/// Deletes `record` according to its model's policy, or `force_policy` when given.
pub async fn delete(
    db: &Database,
    meta: &Arc<ModelMeta>,
    record: &Record,
    force_policy: Option<DeletePolicy>,
) -> Result<DeletionResult> {
    let current = refresh(db, meta, record).await?;
    let pk = meta.pk_of(&current)?;
    let policy = force_policy.unwrap_or_else(|| meta.delete_policy());
    debug!("Deleting {} {} with {}", meta.table, value_key(&pk), policy.as_str());

    let (at, marker) = now_marker();
    let result = |policy, outcome, related_affected| DeletionResult {
        table: meta.table.clone(),
        pk: pk.clone(),
        policy,
        outcome,
        deleted_at: at,
        related_affected,
    };

    match policy {
        DeletePolicy::NoDelete => {
            warn!("Refusing to delete {} {}: policy is NO_DELETE", meta.table, value_key(&pk));
            Err(SafeDeleteError::PolicyViolation {
                table: meta.table.clone(),
                policy: policy.as_str().to_string(),
            })
        }
        DeletePolicy::SoftDelete => {
            soft_delete(db, meta, &current, &marker).await?;
            Ok(result(policy, DeletionOutcome::SoftDeleted, 0))
        }
        DeletePolicy::SoftDeleteCascade => {
            let (_, affected) = soft_delete_cascade(db, meta, &current, &marker).await?;
            Ok(result(policy, DeletionOutcome::SoftDeleted, affected))
        }
        DeletePolicy::HardDelete => {
            let affected = hard_delete(db, meta, &current).await?;
            Ok(result(policy, DeletionOutcome::HardDeleted, affected))
        }
        DeletePolicy::HardDeleteNocascade => {
            if can_hard_delete(db, meta, &current).await? {
                let affected = hard_delete(db, meta, &current).await?;
                Ok(result(DeletePolicy::HardDelete, DeletionOutcome::HardDeleted, affected))
            } else {
                debug!("{} {} has dependents, soft deleting instead", meta.table, value_key(&pk));
                soft_delete(db, meta, &current, &marker).await?;
                Ok(result(DeletePolicy::SoftDelete, DeletionOutcome::SoftDeleted, 0))
            }
        }
    }
}
