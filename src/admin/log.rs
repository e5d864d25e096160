use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::Result;
use crate::database::Database;
use crate::db::record::value_key;
use crate::db::{Filter, Record, Select, from_record, to_record};
use crate::schema::ModelMeta;


/// Same numbering as the usual admin change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ActionFlag {
    Addition = 1,
    Change = 2,
    Deletion = 3,
}

impl From<ActionFlag> for u8 {
    fn from(flag: ActionFlag) -> Self {
        flag as u8
    }
}

impl TryFrom<u8> for ActionFlag {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Addition),
            2 => Ok(Self::Change),
            3 => Ok(Self::Deletion),
            other => Err(format!("unknown action flag {other}")),
        }
    }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub action_time: DateTime<Utc>,
    pub user: String,
    pub table: String,
    pub object_id: String,
    pub object_repr: String,
    pub action_flag: ActionFlag,
    pub change_message: String,
}


/// Audit trail kept as rows of a dedicated table in the same store.
#[derive(Clone)]
pub struct AuditLog {
    db: Database,
    meta: ModelMeta,
}

impl AuditLog {
    pub async fn new(db: Database) -> Result<Self> {
        let meta = ModelMeta::new(db.config().audit_log_table.clone());
        db.store().create_table(&meta).await?;
        Ok(Self { db, meta })
    }

    pub async fn log_action(
        &self,
        user: &str,
        meta: &ModelMeta,
        record: &Record,
        action_flag: ActionFlag,
        message: &str,
    ) -> Result<LogEntry> {
        let entry = LogEntry {
            id: Uuid::new_v4(),
            action_time: Utc::now(),
            user: user.to_string(),
            table: meta.table.clone(),
            object_id: value_key(record.get(&meta.pk_field).unwrap_or(&Value::Null)),
            object_repr: meta.display_value(record),
            action_flag,
            change_message: message.to_string(),
        };
        self.db.store().insert(&self.meta.table, to_record(&entry)?).await?;
        debug!("Audit: {} {:?} {} {}", user, action_flag, entry.table, entry.object_id);
        Ok(entry)
    }

    /// Entries about one table, oldest first. Entries logged at the same instant keep insertion order.
    pub async fn entries_for(&self, table: &str) -> Result<Vec<LogEntry>> {
        let select = Select::new(Filter::eq("table", table));
        let mut entries = self
            .db
            .store()
            .select(&self.meta.table, &select)
            .await?
            .iter()
            .map(from_record)
            .collect::<Result<Vec<LogEntry>>>()?;
        // Serialized times carry a variable number of fractional digits, so order on the parsed value.
        entries.sort_by_key(|entry| entry.action_time);
        Ok(entries)
    }
}
