use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::queryset::QuerySet;
use super::visibility::Visibility;
use crate::core::error::{Result, SafeDeleteError};
use crate::database::Database;
use crate::db::record::value_key;
use crate::db::{Filter, Record};
use crate::deletion::{self, DeletePolicy};
use crate::schema::ModelMeta;


/// Entry point for queries on one model.
#[derive(Clone)]
pub struct Manager {
    db: Database,
    meta: Arc<ModelMeta>,
    visibility: Visibility,
    visibility_field: String,
}

impl Manager {
    pub fn new(db: Database, meta: Arc<ModelMeta>) -> Self {
        let visibility_field = match db.config().visibility_field.as_deref() {
            Some(field) if field != "pk" => field.to_string(),
            _ => meta.pk_field.clone(),
        };
        Self {
            db,
            meta,
            visibility: Visibility::DeletedInvisible,
            visibility_field,
        }
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Field whose lookups reveal deleted rows under `DeletedVisibleByPk`. `"pk"` names the primary key.
    #[must_use]
    pub fn with_visibility_field(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.visibility_field = if field == "pk" { self.meta.pk_field.clone() } else { field };
        self
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn meta(&self) -> &Arc<ModelMeta> {
        &self.meta
    }

    pub(crate) fn database(&self) -> &Database {
        &self.db
    }

    pub fn get_queryset(&self) -> QuerySet {
        QuerySet::new(
            self.db.clone(),
            Arc::clone(&self.meta),
            self.visibility,
            self.visibility_field.clone(),
        )
    }

    pub fn all(&self) -> QuerySet {
        self.get_queryset()
    }

    /// Soft deleted rows included, whatever this manager's visibility.
    pub fn all_with_deleted(&self) -> QuerySet {
        self.get_queryset().all(Some(Visibility::DeletedVisible))
    }

    pub fn deleted_only(&self) -> QuerySet {
        self.get_queryset().all(Some(Visibility::DeletedOnlyVisible))
    }

    pub fn filter(&self, filter: Filter) -> QuerySet {
        self.get_queryset().filter(filter)
    }

    pub fn exclude(&self, filter: Filter) -> QuerySet {
        self.get_queryset().exclude(filter)
    }

    pub async fn get(&self, pk: impl Into<Value>) -> Result<Record> {
        self.get_queryset()
            .get(Filter::Eq(self.meta.pk_field.clone(), pk.into()))
            .await
    }

    pub async fn count(&self) -> Result<usize> {
        self.get_queryset().count().await
    }

    /// Rows of this model whose `fk_field` points at `parent_pk`.
    pub fn related(&self, fk_field: &str, parent_pk: Value) -> QuerySet {
        self.get_queryset()
            .filter(Filter::Eq(fk_field.to_string(), parent_pk))
            .order_by(self.meta.pk_field.clone())
    }

    /// Validates unique fields, soft deleted rows included, then inserts.
    pub async fn create(&self, record: Record) -> Result<Record> {
        deletion::validate_unique(&self.db, &self.meta, &record).await?;
        deletion::save(&self.db, &self.meta, record, false).await
    }

    pub async fn get_or_create(&self, lookup: Record, defaults: Record) -> Result<(Record, bool)> {
        match self.get_queryset().get(Filter::from_lookup(&lookup)).await {
            Ok(found) => Ok((found, false)),
            Err(SafeDeleteError::NotFound { .. }) => {
                let mut record = lookup;
                record.extend(defaults);
                Ok((self.create(record).await?, true))
            }
            Err(e) => Err(e),
        }
    }

    /// `update_or_create` that first revives a soft deleted row matching `lookup`
    /// when the model is soft deleting and has unique fields. Otherwise the insert
    /// would collide with the hidden row.
    pub async fn update_or_create(&self, lookup: Record, defaults: Record) -> Result<(Record, bool)> {
        let lookup_filter = Filter::from_lookup(&lookup);

        if Self::soft_delete_policies().contains(&self.meta.delete_policy()) && self.meta.has_unique_fields() {
            let revivable = self
                .all_with_deleted()
                .filter(lookup_filter.clone())
                .filter(Filter::not_null(self.meta.marker_field()))
                .first()
                .await?;
            if let Some(deleted) = revivable {
                let pk = deleted.get(&self.meta.pk_field).map(value_key).unwrap_or_default();
                info!("Reviving soft deleted {} {}", self.meta.table, pk);
                deletion::save(&self.db, &self.meta, deleted, false).await?;
            }
        }

        match self.get_queryset().get(lookup_filter).await {
            Ok(mut existing) => {
                existing.extend(defaults);
                let saved = deletion::save(&self.db, &self.meta, existing, false).await?;
                debug!("update_or_create updated {}", self.meta.table);
                Ok((saved, false))
            }
            Err(SafeDeleteError::NotFound { .. }) => {
                let mut record = lookup;
                record.extend(defaults);
                let created = deletion::save(&self.db, &self.meta, record, false).await?;
                debug!("update_or_create created {}", self.meta.table);
                Ok((created, true))
            }
            Err(e) => Err(e),
        }
    }

    /// Policies under which deleted rows stay in storage.
    pub fn soft_delete_policies() -> [DeletePolicy; 2] {
        [DeletePolicy::SoftDelete, DeletePolicy::SoftDeleteCascade]
    }
}
