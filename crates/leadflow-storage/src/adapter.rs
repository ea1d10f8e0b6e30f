// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the LeadStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use leadflow_config::model::StorageConfig;
use leadflow_core::{
    AdapterType, HealthStatus, Lead, LeadId, LeadStore, LeadflowError, PluginAdapter, Sale,
    SaleId,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed lead store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened on the first call to
/// [`LeadStore::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, LeadflowError> {
        self.db.get().ok_or_else(|| LeadflowError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl LeadStore for SqliteStorage {
    async fn initialize(&self) -> Result<(), LeadflowError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| LeadflowError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), LeadflowError> {
        self.db()?.checkpoint().await
    }

    async fn insert_lead(&self, lead: &Lead) -> Result<(), LeadflowError> {
        queries::leads::insert_lead(self.db()?, lead).await
    }

    async fn get_lead(&self, id: LeadId) -> Result<Option<Lead>, LeadflowError> {
        queries::leads::get_lead(self.db()?, id).await
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, LeadflowError> {
        queries::leads::list_leads(self.db()?).await
    }

    async fn save_lead(&self, lead: &Lead, expected_version: u64) -> Result<(), LeadflowError> {
        queries::leads::save_lead(self.db()?, lead, expected_version).await
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<Sale>, LeadflowError> {
        queries::sales::get_sale(self.db()?, id).await
    }

    async fn get_sale_by_lead(&self, lead_id: LeadId) -> Result<Option<Sale>, LeadflowError> {
        queries::sales::get_sale_by_lead(self.db()?, lead_id).await
    }

    async fn save_sale(&self, sale: &Sale, expected_version: u64) -> Result<(), LeadflowError> {
        queries::sales::save_sale(self.db()?, sale, expected_version).await
    }

    async fn commit_transfer(
        &self,
        lead: &Lead,
        expected_lead_version: u64,
        sale: &Sale,
    ) -> Result<(), LeadflowError> {
        queries::transfer::commit_transfer(self.db()?, lead, expected_lead_version, sale).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::{ColdStage, LeadSource};
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_check_tracks_initialization() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(storage.health_check().await.is_err());
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn operations_before_initialize_fail_with_storage_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("uninit.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        let err = storage.list_leads().await.unwrap_err();
        assert!(matches!(err, LeadflowError::Storage { .. }));
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("persist.db");
        let path = db_path.to_str().unwrap();

        let mut lead = Lead::create(LeadSource::Manual, None);
        {
            let storage = SqliteStorage::new(make_config(path));
            storage.initialize().await.unwrap();
            storage.insert_lead(&lead).await.unwrap();
            lead.update_stage(ColdStage::Contacted).unwrap();
            storage.save_lead(&lead, 0).await.unwrap();
            storage.close().await.unwrap();
            storage.shutdown().await.unwrap();
        }

        let storage = SqliteStorage::new(make_config(path));
        storage.initialize().await.unwrap();
        let loaded = storage.get_lead(lead.id()).await.unwrap().unwrap();
        assert_eq!(loaded.stage(), ColdStage::Contacted);
        assert_eq!(loaded.version(), 1);
    }
}
