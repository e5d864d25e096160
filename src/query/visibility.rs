use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::db::Filter;


/// Whether soft deleted rows show up in a result set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Visibility {
    #[default]
    DeletedInvisible,
    DeletedVisible,
    DeletedOnlyVisible,
    /// Hidden, except for queries that filter on the visibility field (the primary key by default).
    DeletedVisibleByPk,
}

impl TryFrom<String> for Visibility {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Visibility {
    /// Condition on the deleted marker, `None` when every row qualifies.
    #[must_use]
    pub fn marker_filter(&self, deleted_field: &str) -> Option<Filter> {
        match self {
            Self::DeletedInvisible | Self::DeletedVisibleByPk => Some(Filter::is_null(deleted_field)),
            Self::DeletedOnlyVisible => Some(Filter::not_null(deleted_field)),
            Self::DeletedVisible => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_marker_filters() {
        let alive = json!({"id": 1, "deleted": null});
        let gone = json!({"id": 2, "deleted": "2024-01-01T00:00:00Z"});
        let alive = alive.as_object().unwrap();
        let gone = gone.as_object().unwrap();

        let hidden = Visibility::DeletedInvisible.marker_filter("deleted").unwrap();
        assert!(hidden.matches(alive));
        assert!(!hidden.matches(gone));

        let only = Visibility::DeletedOnlyVisible.marker_filter("deleted").unwrap();
        assert!(!only.matches(alive));
        assert!(only.matches(gone));

        assert!(Visibility::DeletedVisible.marker_filter("deleted").is_none());
    }

    #[test]
    fn test_by_pk_hides_by_default() {
        let filter = Visibility::DeletedVisibleByPk.marker_filter("deleted");
        assert_eq!(filter, Some(Filter::is_null("deleted")));
    }
}
