use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::core::config::SafeDeleteConfig;
use crate::core::error::Result;
use crate::core::events::EventBus;
use crate::db::{MemoryStore, Record, Store};
use crate::deletion::{self, DeletePolicy, DeletionResult, RestoreResult};
use crate::query::{Manager, Visibility};
use crate::schema::{ForeignKey, ModelMeta, Registry};


/// Handle tying a [`Store`] to the registered models, configuration and signals.
///
/// Cloning is cheap; every clone shares the same store and registry.
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn Store>,
    registry: Arc<RwLock<Registry>>,
    config: Arc<SafeDeleteConfig>,
    events: Arc<EventBus>,
}

impl Database {
    pub fn new(store: Arc<dyn Store>, config: SafeDeleteConfig) -> Self {
        let registry = Registry::new(config.default_policy, config.deleted_field.clone());
        info!(
            "Database initialized (default_policy={}, deleted_field={})",
            config.default_policy.as_str(),
            config.deleted_field
        );
        Self {
            store,
            registry: Arc::new(RwLock::new(registry)),
            config: Arc::new(config),
            events: Arc::new(EventBus::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), SafeDeleteConfig::default())
    }

    /// Declares the model's table in the store and makes it known to managers.
    pub async fn register(&self, meta: ModelMeta) -> Result<Arc<ModelMeta>> {
        let meta = self.registry.write().register(meta);
        self.store.create_table(&meta).await?;
        Ok(meta)
    }

    pub fn meta(&self, table: &str) -> Result<Arc<ModelMeta>> {
        self.registry.read().get(table)
    }

    pub fn dependents(&self, table: &str) -> Vec<(Arc<ModelMeta>, ForeignKey)> {
        self.registry.read().dependents(table)
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn config(&self) -> &SafeDeleteConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Default manager, hiding deleted rows unless configured otherwise.
    pub fn objects(&self, table: &str) -> Result<Manager> {
        Ok(Manager::new(self.clone(), self.meta(table)?).with_visibility(self.config.default_visibility))
    }

    pub fn all_objects(&self, table: &str) -> Result<Manager> {
        Ok(Manager::new(self.clone(), self.meta(table)?).with_visibility(Visibility::DeletedVisible))
    }

    pub fn deleted_objects(&self, table: &str) -> Result<Manager> {
        Ok(Manager::new(self.clone(), self.meta(table)?).with_visibility(Visibility::DeletedOnlyVisible))
    }

    pub async fn save(&self, table: &str, record: Record, keep_deleted: bool) -> Result<Record> {
        let meta = self.meta(table)?;
        deletion::save(self, &meta, record, keep_deleted).await
    }

    pub async fn refresh(&self, table: &str, record: &Record) -> Result<Record> {
        let meta = self.meta(table)?;
        deletion::refresh(self, &meta, record).await
    }

    pub async fn delete(
        &self,
        table: &str,
        record: &Record,
        force_policy: Option<DeletePolicy>,
    ) -> Result<DeletionResult> {
        let meta = self.meta(table)?;
        deletion::delete(self, &meta, record, force_policy).await
    }

    pub async fn undelete(
        &self,
        table: &str,
        record: &Record,
        force_policy: Option<DeletePolicy>,
    ) -> Result<RestoreResult> {
        let meta = self.meta(table)?;
        deletion::undelete(self, &meta, record, force_policy).await
    }

    pub async fn validate_unique(&self, table: &str, record: &Record) -> Result<()> {
        let meta = self.meta(table)?;
        deletion::validate_unique(self, &meta, record).await
    }

    pub async fn is_deleted(&self, table: &str, record: &Record) -> Result<bool> {
        let meta = self.meta(table)?;
        let current = deletion::refresh(self, &meta, record).await?;
        Ok(meta.is_deleted(&current))
    }
}
