use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::Result;
use crate::deletion::DeletePolicy;
use crate::query::Visibility;
use crate::schema::DEFAULT_DELETED_FIELD;


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeDeleteConfig {
    /// Column holding the deleted marker on models that don't name their own.
    pub deleted_field: String,
    /// Policy for models registered without one.
    pub default_policy: DeletePolicy,
    /// Visibility of `Manager::objects`.
    pub default_visibility: Visibility,
    /// Field that unlocks deleted rows under `DELETED_VISIBLE_BY_PK`; `None` means the primary key.
    pub visibility_field: Option<String>,

    pub audit_log_enabled: bool,
    pub audit_log_table: String,
}

impl SafeDeleteConfig {
    pub fn new() -> Self {
        Self {
            deleted_field: DEFAULT_DELETED_FIELD.to_string(),
            default_policy: DeletePolicy::SoftDelete,
            default_visibility: Visibility::DeletedInvisible,
            visibility_field: None,
            audit_log_enabled: true,
            audit_log_table: "safedelete_logentry".to_string(),
        }
    }

    pub fn from_env() -> Self {
        let mut config = Self::new();

        if let Ok(field) = std::env::var("SAFEDELETE_DELETED_FIELD") {
            config.deleted_field = field;
        }
        if let Some(policy) = std::env::var("SAFEDELETE_DEFAULT_POLICY")
            .ok()
            .and_then(|p| DeletePolicy::from_str(&p).ok())
        {
            config.default_policy = policy;
        }
        if let Some(visibility) = std::env::var("SAFEDELETE_DEFAULT_VISIBILITY")
            .ok()
            .and_then(|v| Visibility::from_str(&v).ok())
        {
            config.default_visibility = visibility;
        }
        if let Ok(field) = std::env::var("SAFEDELETE_VISIBILITY_FIELD") {
            config.visibility_field = Some(field);
        }
        if let Ok(enabled) = std::env::var("SAFEDELETE_AUDIT_LOG_ENABLED") {
            config.audit_log_enabled = parse_flag(&enabled).unwrap_or(config.audit_log_enabled);
        }
        if let Ok(table) = std::env::var("SAFEDELETE_AUDIT_LOG_TABLE") {
            config.audit_log_table = table;
        }

        config
    }

    /// Layers an optional config file (toml, yaml or json by extension) under `SAFEDELETE_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix("SAFEDELETE"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// Boolean spellings the `config` crate accepts for environment values.
fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl Default for SafeDeleteConfig {
    fn default() -> Self {
        Self::new()
    }
}
