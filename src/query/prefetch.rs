use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use super::manager::Manager;
use crate::core::error::{Result, SafeDeleteError};
use crate::db::record::value_key;
use crate::db::{Filter, Record};


/// Related rows loaded in one query, grouped by the parent they point at.
///
/// The lists were filtered once, when the batch ran; reading them never filters again.
#[derive(Debug, Clone, Default)]
pub struct Prefetched {
    groups: HashMap<String, Vec<Record>>,
}

impl Prefetched {
    pub fn get(&self, parent_pk: &Value) -> &[Record] {
        self.groups
            .get(&value_key(parent_pk))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

impl Manager {
    /// Loads the rows of this model pointing at each of `parents` through `fk_field`.
    ///
    /// For every parent the group equals `self.related(fk_field, pk).fetch()`.
    pub async fn prefetch_related(&self, fk_field: &str, parents: &[Record]) -> Result<Prefetched> {
        let fk = self.meta().foreign_key_for(fk_field).ok_or_else(|| {
            SafeDeleteError::UnknownModel(format!("{}.{}", self.meta().table, fk_field))
        })?;
        let parent_meta = self.database().meta(&fk.to)?;

        let parent_pks = parents
            .iter()
            .map(|parent| parent_meta.pk_of(parent))
            .collect::<Result<Vec<Value>>>()?;
        if parent_pks.is_empty() {
            return Ok(Prefetched::default());
        }

        let rows = self
            .get_queryset()
            .freeze_visibility()
            .filter(Filter::In(fk_field.to_string(), parent_pks))
            .order_by(self.meta().pk_field.clone())
            .fetch()
            .await?;

        let mut groups: HashMap<String, Vec<Record>> = HashMap::new();
        for row in rows {
            let key = value_key(row.get(fk_field).unwrap_or(&Value::Null));
            groups.entry(key).or_default().push(row);
        }
        debug!(
            "Prefetched {} {} rows for {} {} parents",
            groups.values().map(Vec::len).sum::<usize>(),
            self.meta().table,
            parents.len(),
            parent_meta.table
        );
        Ok(Prefetched { groups })
    }
}
