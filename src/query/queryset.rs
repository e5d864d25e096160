use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::visibility::Visibility;
use crate::core::error::{Result, SafeDeleteError};
use crate::database::Database;
use crate::db::{Filter, OrderBy, Record, Select, from_record};
use crate::deletion::{self, DeletePolicy, DeletionResult, RestoreResult};
use crate::schema::ModelMeta;


/// Lazy query over one table. The visibility condition on the deleted marker is
/// added when the query runs, never while it is being built.
#[derive(Clone)]
pub struct QuerySet {
    db: Database,
    meta: Arc<ModelMeta>,
    filters: Vec<Filter>,
    order_by: Vec<OrderBy>,
    limit: Option<usize>,
    visibility: Visibility,
    visibility_field: String,
    force_visibility: Option<Visibility>,
    /// Set once the visibility condition has been folded into `filters`.
    visibility_applied: bool,
    /// The query pins the visibility field, which unlocks deleted rows under `DeletedVisibleByPk`.
    field_lookup: bool,
}

impl QuerySet {
    pub(crate) fn new(db: Database, meta: Arc<ModelMeta>, visibility: Visibility, visibility_field: String) -> Self {
        Self {
            db,
            meta,
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            visibility,
            visibility_field,
            force_visibility: None,
            visibility_applied: false,
            field_lookup: false,
        }
    }

    pub fn meta(&self) -> &Arc<ModelMeta> {
        &self.meta
    }

    /// Visibility in effect: the forced one if any, else the manager's.
    pub fn visibility(&self) -> Visibility {
        self.force_visibility.unwrap_or(self.visibility)
    }

    /// Same query; `Some` forces a visibility over the manager's.
    #[must_use]
    pub fn all(mut self, force_visibility: Option<Visibility>) -> Self {
        if force_visibility.is_some() {
            self.force_visibility = force_visibility;
        }
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.check_field_filter(&filter);
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn exclude(mut self, filter: Filter) -> Self {
        self.filters.push(filter.negate());
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by.push(OrderBy::asc(field));
        self
    }

    #[must_use]
    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by.push(OrderBy::desc(field));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn check_field_filter(&mut self, filter: &Filter) {
        if filter.pins(&self.visibility_field) {
            self.field_lookup = true;
        }
    }

    fn visibility_condition(&self) -> Option<Filter> {
        let visibility = self.visibility();
        if visibility == Visibility::DeletedVisibleByPk && self.field_lookup {
            return None;
        }
        visibility.marker_filter(self.meta.marker_field())
    }

    /// Folds the visibility condition into the filters now, so later changes to
    /// visibility or lookups no longer affect which rows qualify.
    #[must_use]
    pub(crate) fn freeze_visibility(mut self) -> Self {
        if !self.visibility_applied {
            if let Some(condition) = self.visibility_condition() {
                self.filters.push(condition);
            }
            self.visibility_applied = true;
        }
        self
    }

    /// Everything the store is asked to match, visibility included.
    pub fn compiled_filter(&self) -> Filter {
        let mut parts = self.filters.clone();
        if !self.visibility_applied {
            if let Some(condition) = self.visibility_condition() {
                parts.push(condition);
            }
        }
        Filter::And(parts)
    }

    fn select(&self) -> Select {
        Select {
            filter: self.compiled_filter(),
            order_by: self.order_by.clone(),
            limit: self.limit,
        }
    }

    pub async fn fetch(&self) -> Result<Vec<Record>> {
        let select = self.select();
        debug!("SELECT {} WHERE {}", self.meta.table, select.filter);
        Ok(self.db.store().select(&self.meta.table, &select).await?)
    }

    pub async fn fetch_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.fetch().await?.iter().map(from_record).collect()
    }

    /// First row by the query's ordering, or by primary key when it has none.
    pub async fn first(&self) -> Result<Option<Record>> {
        let mut qs = self.clone();
        if qs.order_by.is_empty() {
            qs.order_by.push(OrderBy::asc(self.meta.pk_field.clone()));
        }
        qs.limit = Some(1);
        Ok(qs.fetch().await?.pop())
    }

    /// Exactly one row matching `filter`.
    pub async fn get(&self, filter: Filter) -> Result<Record> {
        let lookup = filter.to_string();
        let qs = self.clone().filter(filter).limit(2);
        let mut rows = qs.fetch().await?;
        match rows.len() {
            0 => Err(SafeDeleteError::NotFound {
                table: self.meta.table.clone(),
                lookup,
            }),
            1 => Ok(rows.remove(0)),
            _ => Err(SafeDeleteError::MultipleObjectsReturned {
                table: self.meta.table.clone(),
                count: qs.count().await?,
            }),
        }
    }

    pub async fn count(&self) -> Result<usize> {
        let mut qs = self.clone();
        qs.limit = None;
        Ok(self
            .db
            .store()
            .count(&self.meta.table, &qs.compiled_filter())
            .await?)
    }

    pub async fn exists(&self) -> Result<bool> {
        Ok(self.clone().limit(1).fetch().await?.len() == 1)
    }

    pub async fn pks(&self) -> Result<Vec<Value>> {
        self.fetch()
            .await?
            .iter()
            .map(|row| self.meta.pk_of(row))
            .collect()
    }

    /// Writes `values` into every matched row. Returns how many rows changed.
    pub async fn update(&self, values: &Record) -> Result<usize> {
        let filter = Filter::is_in(self.meta.pk_field.clone(), self.pks().await?);
        Ok(self.db.store().update(&self.meta.table, &filter, values).await?)
    }

    /// Deletes every matched row through its model policy.
    ///
    /// Rows already removed by an earlier row's cascade are skipped.
    pub async fn delete(&self, force_policy: Option<DeletePolicy>) -> Result<Vec<DeletionResult>> {
        let mut results = Vec::new();
        for row in self.fetch().await? {
            match deletion::delete(&self.db, &self.meta, &row, force_policy).await {
                Ok(result) => results.push(result),
                Err(SafeDeleteError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(results)
    }

    /// Restores every matched row. Only meaningful on querysets that can see deleted rows.
    pub async fn undelete(&self, force_policy: Option<DeletePolicy>) -> Result<Vec<RestoreResult>> {
        let mut results = Vec::new();
        for row in self.fetch().await? {
            match deletion::undelete(&self.db, &self.meta, &row, force_policy).await {
                Ok(result) => results.push(result),
                // restored earlier in this loop by a cascading parent
                Err(SafeDeleteError::NotDeleted { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(results)
    }
}
