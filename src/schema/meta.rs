use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{EnumString, IntoStaticStr};

use crate::core::error::{Result, SafeDeleteError};
use crate::db::Record;
use crate::deletion::DeletePolicy;


pub const DEFAULT_PK_FIELD: &str = "id";

pub const DEFAULT_DELETED_FIELD: &str = "deleted";


/// What happens to a referencing row when its target is hard deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OnDelete {
    #[default]
    Cascade,
    Protect,
    SetNull,
    DoNothing,
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Column on the owning model.
    pub field: String,
    /// Table of the referenced model.
    pub to: String,
    pub on_delete: OnDelete,
}


/// Table-level description of a participating model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMeta {
    pub table: String,
    pub pk_field: String,
    /// Filled from the configuration on registration when left unset.
    pub policy: Option<DeletePolicy>,
    pub deleted_field: Option<String>,
    pub unique_fields: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
    pub display_field: Option<String>,
    pub verbose_name: String,
    pub verbose_name_plural: String,
}

impl ModelMeta {
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            pk_field: DEFAULT_PK_FIELD.to_string(),
            policy: None,
            deleted_field: None,
            unique_fields: Vec::new(),
            foreign_keys: Vec::new(),
            display_field: None,
            verbose_name: table.replace('_', " "),
            verbose_name_plural: format!("{}s", table.replace('_', " ")),
            table,
        }
    }

    #[must_use]
    pub fn pk(mut self, field: impl Into<String>) -> Self {
        self.pk_field = field.into();
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: DeletePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    #[must_use]
    pub fn deleted_field(mut self, field: impl Into<String>) -> Self {
        self.deleted_field = Some(field.into());
        self
    }

    #[must_use]
    pub fn unique(mut self, field: impl Into<String>) -> Self {
        self.unique_fields.push(field.into());
        self
    }

    #[must_use]
    pub fn foreign_key(mut self, field: impl Into<String>, to: impl Into<String>, on_delete: OnDelete) -> Self {
        self.foreign_keys.push(ForeignKey {
            field: field.into(),
            to: to.into(),
            on_delete,
        });
        self
    }

    #[must_use]
    pub fn display(mut self, field: impl Into<String>) -> Self {
        self.display_field = Some(field.into());
        self
    }

    #[must_use]
    pub fn verbose_names(mut self, singular: impl Into<String>, plural: impl Into<String>) -> Self {
        self.verbose_name = singular.into();
        self.verbose_name_plural = plural.into();
        self
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.policy.unwrap_or_default()
    }

    pub fn marker_field(&self) -> &str {
        self.deleted_field.as_deref().unwrap_or(DEFAULT_DELETED_FIELD)
    }

    pub fn has_unique_fields(&self) -> bool {
        !self.unique_fields.is_empty()
    }

    pub fn foreign_key_for(&self, field: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.field == field)
    }

    pub fn pk_of(&self, record: &Record) -> Result<Value> {
        match record.get(&self.pk_field) {
            Some(Value::Null) | None => Err(SafeDeleteError::MissingPrimaryKey(self.table.clone())),
            Some(pk) => Ok(pk.clone()),
        }
    }

    pub fn marker_of<'a>(&self, record: &'a Record) -> &'a Value {
        record.get(self.marker_field()).unwrap_or(&Value::Null)
    }

    pub fn is_deleted(&self, record: &Record) -> bool {
        !self.marker_of(record).is_null()
    }

    /// Human readable form of a record, used by the admin listing and action messages.
    pub fn display_value(&self, record: &Record) -> String {
        let field = self.display_field.as_deref().unwrap_or(&self.pk_field);
        match record.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => format!("{} object", self.verbose_name),
            Some(other) => other.to_string(),
        }
    }

    pub fn item_name(&self, count: usize) -> &str {
        if count == 1 {
            &self.verbose_name
        } else {
            &self.verbose_name_plural
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let meta = ModelMeta::new("blog_post");
        assert_eq!(meta.pk_field, "id");
        assert_eq!(meta.marker_field(), "deleted");
        assert_eq!(meta.delete_policy(), DeletePolicy::SoftDelete);
        assert_eq!(meta.verbose_name, "blog post");
        assert_eq!(meta.item_name(2), "blog posts");
    }

    #[test]
    fn test_record_accessors() {
        let meta = ModelMeta::new("category").display("name");
        let record = json!({"id": 4, "name": "x", "deleted": "2024-01-01T00:00:00Z"});
        let record = record.as_object().unwrap();
        assert_eq!(meta.pk_of(record).unwrap(), json!(4));
        assert!(meta.is_deleted(record));
        assert_eq!(meta.display_value(record), "x");

        let unsaved = json!({"name": "y"});
        assert!(matches!(
            meta.pk_of(unsaved.as_object().unwrap()),
            Err(SafeDeleteError::MissingPrimaryKey(_))
        ));
    }
}
