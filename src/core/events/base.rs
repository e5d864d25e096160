use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::db::Record;


pub const PRE_SOFTDELETE: &str = "pre_softdelete";

pub const POST_SOFTDELETE: &str = "post_softdelete";

pub const POST_UNDELETE: &str = "post_undelete";

pub const POST_HARD_DELETE: &str = "post_hard_delete";


/// A signal about one record's deletion state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: Uuid,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub table: String,
    pub pk: Value,
    /// Row as it looked when the signal fired.
    pub record: Record,
}

impl Event {
    #[must_use]
    pub fn new(event_type: impl Into<String>, table: impl Into<String>, pk: Value, record: Record) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            table: table.into(),
            pk,
            record,
        }
    }
}
