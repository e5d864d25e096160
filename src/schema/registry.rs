use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::meta::{ForeignKey, ModelMeta};
use crate::core::error::{Result, SafeDeleteError};
use crate::deletion::DeletePolicy;


/// Known models, keyed by table.
pub struct Registry {
    models: HashMap<String, Arc<ModelMeta>>,
    default_policy: DeletePolicy,
    default_deleted_field: String,
}

impl Registry {
    pub fn new(default_policy: DeletePolicy, default_deleted_field: impl Into<String>) -> Self {
        Self {
            models: HashMap::new(),
            default_policy,
            default_deleted_field: default_deleted_field.into(),
        }
    }

    /// Stores `meta`, filling unset policy and marker field from the defaults.
    pub fn register(&mut self, mut meta: ModelMeta) -> Arc<ModelMeta> {
        if meta.policy.is_none() {
            meta.policy = Some(self.default_policy);
        }
        if meta.deleted_field.is_none() {
            meta.deleted_field = Some(self.default_deleted_field.clone());
        }
        debug!(
            "Registered model {} (policy={}, marker={})",
            meta.table,
            meta.delete_policy().as_str(),
            meta.marker_field()
        );
        let meta = Arc::new(meta);
        self.models.insert(meta.table.clone(), Arc::clone(&meta));
        meta
    }

    pub fn get(&self, table: &str) -> Result<Arc<ModelMeta>> {
        self.models
            .get(table)
            .cloned()
            .ok_or_else(|| SafeDeleteError::UnknownModel(table.to_string()))
    }

    pub fn contains(&self, table: &str) -> bool {
        self.models.contains_key(table)
    }

    /// Every foreign key, on any model, that points at `table`.
    pub fn dependents(&self, table: &str) -> Vec<(Arc<ModelMeta>, ForeignKey)> {
        let mut out: Vec<(Arc<ModelMeta>, ForeignKey)> = self
            .models
            .values()
            .flat_map(|meta| {
                meta.foreign_keys
                    .iter()
                    .filter(|fk| fk.to == table)
                    .map(move |fk| (Arc::clone(meta), fk.clone()))
            })
            .collect();
        // HashMap order is random; keep traversal deterministic.
        out.sort_by(|(a, fa), (b, fb)| a.table.cmp(&b.table).then_with(|| fa.field.cmp(&fb.field)));
        out
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }
}
