use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{EnumString, IntoStaticStr};


#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum DeletePolicy {
    /// Refuse every delete.
    NoDelete,
    /// Set the deleted marker and keep the row.
    #[default]
    SoftDelete,
    /// Soft delete the row and everything reachable through cascading foreign keys.
    SoftDeleteCascade,
    /// Remove the row, applying each incoming foreign key's `on_delete`.
    HardDelete,
    /// Remove the row only if nothing would be removed with it, otherwise soft delete.
    HardDeleteNocascade,
}

impl TryFrom<String> for DeletePolicy {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl DeletePolicy {
    #[must_use]
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::SoftDelete | Self::SoftDeleteCascade)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionOutcome {
    SoftDeleted,
    HardDeleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionResult {
    pub table: String,
    pub pk: Value,
    /// Policy that was actually applied, after forcing and fallbacks.
    pub policy: DeletePolicy,
    pub outcome: DeletionOutcome,
    pub deleted_at: DateTime<Utc>,
    /// Dependent rows that were soft deleted, removed or nulled along with this one.
    pub related_affected: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreResult {
    pub table: String,
    pub pk: Value,
    pub restored_at: DateTime<Utc>,
    pub related_restored: usize,
}
