pub mod actions;
pub mod log;
pub mod render;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{EnumString, IntoStaticStr};

use crate::core::error::Result;
use crate::database::Database;
use crate::db::Filter;
use crate::query::{Manager, QuerySet};

pub use actions::{ActionResponse, UNDELETE_SELECTED, UNDELETE_SELECTED_TEMPLATE};
pub use log::{ActionFlag, AuditLog, LogEntry};
pub use render::{escape_html, highlight_deleted};


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Column {
    /// Display value, marked up when the row is soft deleted.
    HighlightDeleted,
    /// The deleted marker itself.
    Deleted,
    Field(String),
}


/// Choice of the "deleted" list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DeletedFilter {
    #[default]
    All,
    Yes,
    No,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilter {
    pub title: String,
    pub parameter: String,
    pub choices: Vec<DeletedFilter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeListRow {
    pub pk: Value,
    pub deleted: bool,
    pub columns: Vec<String>,
}


/// Admin listing for a soft deleting model. Deleted rows are listed alongside alive ones.
#[derive(Clone)]
pub struct SafeDeleteAdmin {
    manager: Manager,
    list_display: Vec<Column>,
    audit: Option<AuditLog>,
}

impl SafeDeleteAdmin {
    pub async fn new(db: &Database, table: &str) -> Result<Self> {
        let audit = if db.config().audit_log_enabled {
            Some(AuditLog::new(db.clone()).await?)
        } else {
            None
        };
        Ok(Self {
            manager: db.objects(table)?,
            list_display: vec![Column::Deleted],
            audit,
        })
    }

    #[must_use]
    pub fn with_list_display(mut self, columns: Vec<Column>) -> Self {
        self.list_display = columns;
        self
    }

    pub fn list_display(&self) -> &[Column] {
        &self.list_display
    }

    pub fn actions(&self) -> &'static [&'static str] {
        &[UNDELETE_SELECTED]
    }

    pub fn audit_log(&self) -> Option<&AuditLog> {
        self.audit.as_ref()
    }

    pub fn queryset(&self) -> QuerySet {
        self.manager.all_with_deleted()
    }

    pub fn list_filters(&self) -> Vec<ListFilter> {
        vec![ListFilter {
            title: "deleted".to_string(),
            parameter: self.manager.meta().marker_field().to_string(),
            choices: vec![DeletedFilter::All, DeletedFilter::Yes, DeletedFilter::No],
        }]
    }

    fn filtered(&self, filter: DeletedFilter) -> QuerySet {
        let marker = self.manager.meta().marker_field();
        let qs = self.queryset().order_by(self.manager.meta().pk_field.clone());
        match filter {
            DeletedFilter::All => qs,
            DeletedFilter::Yes => qs.filter(Filter::not_null(marker)),
            DeletedFilter::No => qs.filter(Filter::is_null(marker)),
        }
    }

    pub async fn changelist(&self, filter: DeletedFilter) -> Result<Vec<ChangeListRow>> {
        let meta = self.manager.meta();
        let rows = self.filtered(filter).fetch().await?;
        rows.iter()
            .map(|record| {
                let columns = self
                    .list_display
                    .iter()
                    .map(|column| match column {
                        Column::HighlightDeleted => render::highlight_deleted(meta, record),
                        Column::Deleted => render::deleted_column(meta, record),
                        Column::Field(field) => render::field_column(record, field),
                    })
                    .collect();
                Ok(ChangeListRow {
                    pk: meta.pk_of(record)?,
                    deleted: meta.is_deleted(record),
                    columns,
                })
            })
            .collect()
    }

    pub async fn changelist_count(&self, filter: DeletedFilter) -> Result<usize> {
        self.filtered(filter).count().await
    }
}
