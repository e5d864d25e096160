use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::SafeDeleteAdmin;
use super::log::ActionFlag;
use crate::core::error::{Result, SafeDeleteError};
use crate::db::Filter;


pub const UNDELETE_SELECTED: &str = "undelete_selected";

pub const UNDELETE_SELECTED_TEMPLATE: &str = "safedelete/undelete_selected_confirmation.html";


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionResponse {
    /// Nothing changed yet; render `template` and ask again with confirmation.
    Confirmation {
        template: String,
        title: String,
        objects: Vec<String>,
    },
    Completed {
        count: usize,
        message: String,
    },
}

impl SafeDeleteAdmin {
    /// Bulk "undelete" over the selected primary keys. Alive rows in the selection are ignored.
    pub async fn undelete_selected(&self, selected: &[Value], confirmed: bool, user: &str) -> Result<ActionResponse> {
        let meta = self.manager.meta();
        let targets = self
            .queryset()
            .filter(Filter::In(meta.pk_field.clone(), selected.to_vec()))
            .filter(Filter::not_null(meta.marker_field()))
            .order_by(meta.pk_field.clone())
            .fetch()
            .await?;

        if !confirmed {
            return Ok(ActionResponse::Confirmation {
                template: UNDELETE_SELECTED_TEMPLATE.to_string(),
                title: "Are you sure?".to_string(),
                objects: targets.iter().map(|r| meta.display_value(r)).collect(),
            });
        }

        let db = self.manager.database();
        let mut count = 0;
        for record in &targets {
            match db.undelete(&meta.table, record, None).await {
                Ok(_) => {}
                // restored through an earlier selection's cascade
                Err(SafeDeleteError::NotDeleted { .. }) => continue,
                Err(e) => return Err(e),
            }
            if let Some(audit) = &self.audit {
                audit
                    .log_action(user, meta, record, ActionFlag::Change, "Undeleted")
                    .await?;
            }
            count += 1;
        }

        let message = format!("Successfully undeleted {} {}.", count, meta.item_name(count));
        info!("{} by {}", message, user);
        Ok(ActionResponse::Completed { count, message })
    }
}
