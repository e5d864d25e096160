use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use super::filter::{Filter, Select};
use super::record::Record;
use super::store::{Store, StoreError};
use crate::schema::ModelMeta;


struct Table {
    pk_field: String,
    unique_fields: Vec<String>,
    rows: Vec<Record>,
    next_id: i64,
}

impl Table {
    fn conflict(&self, candidate: &Record, skip: Option<usize>) -> Option<String> {
        self.conflict_in(&self.rows, candidate, skip)
    }

    /// First constrained field on which `candidate` collides with a row of `rows` other than `skip`.
    fn conflict_in(&self, rows: &[Record], candidate: &Record, skip: Option<usize>) -> Option<String> {
        let mut checked = vec![self.pk_field.as_str()];
        checked.extend(self.unique_fields.iter().map(String::as_str));

        for field in checked {
            let value = match candidate.get(field) {
                Some(Value::Null) | None => continue,
                Some(v) => v,
            };
            let clash = rows
                .iter()
                .enumerate()
                .any(|(i, row)| Some(i) != skip && row.get(field) == Some(value));
            if clash {
                return Some(field.to_string());
            }
        }
        None
    }
}


/// Process-local [`Store`] with primary key and unique constraint enforcement.
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, |t| t.rows.len())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_table(&self, meta: &ModelMeta) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let table = tables.entry(meta.table.clone()).or_insert_with(|| Table {
            pk_field: meta.pk_field.clone(),
            unique_fields: Vec::new(),
            rows: Vec::new(),
            next_id: 1,
        });
        table.pk_field = meta.pk_field.clone();
        table.unique_fields = meta.unique_fields.clone();
        debug!("MemoryStore table ready: {}", meta.table);
        Ok(())
    }

    async fn select(&self, table: &str, select: &Select) -> Result<Vec<Record>, StoreError> {
        let tables = self.tables.read();
        let t = tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        let mut rows: Vec<Record> = t
            .rows
            .iter()
            .filter(|row| select.filter.matches(row))
            .cloned()
            .collect();
        select.finish(&mut rows);
        Ok(rows)
    }

    async fn count(&self, table: &str, filter: &Filter) -> Result<usize, StoreError> {
        let tables = self.tables.read();
        let t = tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        Ok(t.rows.iter().filter(|row| filter.matches(row)).count())
    }

    async fn insert(&self, table: &str, mut record: Record) -> Result<Record, StoreError> {
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;

        match record.get(&t.pk_field) {
            Some(Value::Null) | None => {
                record.insert(t.pk_field.clone(), Value::from(t.next_id));
                t.next_id += 1;
            }
            Some(pk) => {
                if let Some(n) = pk.as_i64() {
                    t.next_id = t.next_id.max(n + 1);
                }
            }
        }

        if let Some(field) = t.conflict(&record, None) {
            return Err(StoreError::Integrity(format!("UNIQUE constraint failed: {table}.{field}")));
        }

        t.rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, table: &str, filter: &Filter, values: &Record) -> Result<usize, StoreError> {
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;

        let targets: Vec<usize> = t
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| filter.matches(row))
            .map(|(i, _)| i)
            .collect();

        // All merged rows are checked against each other and the untouched rows before any is written.
        let mut staged = t.rows.clone();
        for &i in &targets {
            for (k, v) in values {
                staged[i].insert(k.clone(), v.clone());
            }
        }
        for &i in &targets {
            if let Some(field) = t.conflict_in(&staged, &staged[i], Some(i)) {
                return Err(StoreError::Integrity(format!("UNIQUE constraint failed: {table}.{field}")));
            }
        }
        t.rows = staged;
        Ok(targets.len())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<usize, StoreError> {
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        let before = t.rows.len();
        t.rows.retain(|row| !filter.matches(row));
        Ok(before - t.rows.len())
    }
}
