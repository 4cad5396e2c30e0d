// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use selenggara_config::model::StorageConfig;
use selenggara_core::types::{
    AuditEntry, DropdownOption, EquipmentTicket, LogPage, TicketFields, TicketFilter, TicketKey,
    YearDensity,
};
use selenggara_core::{HealthStatus, PluginAdapter, SelenggaraError, StorageAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already-open database. Used with [`Database::open_in_memory`].
    pub fn from_database(config: StorageConfig, db: Database) -> Self {
        Self {
            config,
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, SelenggaraError> {
        self.db.get().ok_or_else(|| SelenggaraError::Storage {
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

    async fn health_check(&self) -> Result<HealthStatus, SelenggaraError> {
        match self.db.get() {
            None => Ok(HealthStatus::Unhealthy("storage not initialized".into())),
            Some(db) => match db.ping().await {
                Ok(()) => Ok(HealthStatus::Healthy),
                Err(e) => {
                    warn!(error = %e, "storage health check failed");
                    Ok(HealthStatus::Unhealthy("database unreachable".into()))
                }
            },
        }
    }

    async fn shutdown(&self) -> Result<(), SelenggaraError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), SelenggaraError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| SelenggaraError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), SelenggaraError> {
        self.db()?.checkpoint().await
    }

    // --- Equipment tickets ---

    async fn create_ticket(
        &self,
        year: i64,
        fields: &TicketFields,
    ) -> Result<EquipmentTicket, SelenggaraError> {
        queries::equipment::create_ticket(self.db()?, year, fields).await
    }

    async fn update_ticket(
        &self,
        key: TicketKey,
        fields: &TicketFields,
    ) -> Result<(EquipmentTicket, EquipmentTicket), SelenggaraError> {
        queries::equipment::update_ticket(self.db()?, key, fields).await
    }

    async fn update_ticket_status(
        &self,
        key: TicketKey,
        status: &str,
    ) -> Result<(EquipmentTicket, EquipmentTicket), SelenggaraError> {
        queries::equipment::update_ticket_status(self.db()?, key, status).await
    }

    async fn delete_ticket(&self, key: TicketKey) -> Result<EquipmentTicket, SelenggaraError> {
        queries::equipment::delete_ticket(self.db()?, key).await
    }

    async fn get_ticket(&self, key: TicketKey) -> Result<Option<EquipmentTicket>, SelenggaraError> {
        queries::equipment::get_ticket(self.db()?, key).await
    }

    async fn list_tickets(
        &self,
        filter: &TicketFilter,
    ) -> Result<Vec<EquipmentTicket>, SelenggaraError> {
        queries::equipment::list_tickets(self.db()?, filter).await
    }

    async fn next_bil(&self, year: i64) -> Result<i64, SelenggaraError> {
        queries::equipment::next_bil(self.db()?, year).await
    }

    async fn next_id(&self) -> Result<i64, SelenggaraError> {
        queries::equipment::next_id(self.db()?).await
    }

    async fn year_density(&self) -> Result<Vec<YearDensity>, SelenggaraError> {
        queries::equipment::year_density(self.db()?).await
    }

    async fn renumber_year(&self, year: i64) -> Result<usize, SelenggaraError> {
        queries::equipment::renumber_year(self.db()?, year).await
    }

    // --- Dropdown registry ---

    async fn list_dropdown_options(&self) -> Result<Vec<DropdownOption>, SelenggaraError> {
        queries::dropdowns::list_options(self.db()?).await
    }

    async fn add_dropdown_option(&self, option: &DropdownOption) -> Result<(), SelenggaraError> {
        queries::dropdowns::add_option(self.db()?, option).await
    }

    async fn delete_dropdown_option(
        &self,
        option: &DropdownOption,
    ) -> Result<bool, SelenggaraError> {
        queries::dropdowns::delete_option(self.db()?, option).await
    }

    // --- Audit log ---

    async fn append_log(&self, entry: &AuditEntry) -> Result<(), SelenggaraError> {
        queries::logs::append(self.db()?, entry).await
    }

    async fn list_logs(&self, page: i64, limit: i64) -> Result<LogPage, SelenggaraError> {
        queries::logs::list(self.db()?, page, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    fn fields(no_resit: &str) -> TicketFields {
        TicketFields {
            no_resit: no_resit.to_string(),
            name: "Kpl. Daud".into(),
            location: "IPK Selangor".into(),
            branch: "JSJ".into(),
            device: "Printer".into(),
            device_name: "HP LaserJet".into(),
            problem: "Paper jam".into(),
            technician: "Siti".into(),
            status: "KIV".into(),
            tarikh_diresit: Some("2025-06-10".into()),
            ..TicketFields::default()
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let storage = SqliteStorage::new(make_config("unused.db"));
        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_reflects_initialization() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(matches!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn failed_ping_reports_generic_detail() {
        let db = Database::open_in_memory().await.unwrap();
        let storage = SqliteStorage::from_database(make_config(":memory:"), db.clone());
        let _ = db.connection().clone().close().await;

        assert_eq!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy("database unreachable".into())
        );
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let storage = SqliteStorage::new(make_config("never-opened.db"));
        let err = storage.next_id().await.unwrap_err();
        assert!(matches!(err, SelenggaraError::Storage { .. }));
    }

    #[tokio::test]
    async fn ticket_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        let created = storage.create_ticket(2025, &fields("4321")).await.unwrap();
        assert_eq!((created.bil, created.id), (1, 1));
        assert_eq!(storage.next_bil(2025).await.unwrap(), 2);

        let (_, after) = storage
            .update_ticket_status(created.key(), "Selesai")
            .await
            .unwrap();
        assert_eq!(after.fields.status, "Selesai");

        let fetched = storage.get_ticket(created.key()).await.unwrap().unwrap();
        assert_eq!(fetched, after);

        let deleted = storage.delete_ticket(created.key()).await.unwrap();
        assert_eq!(deleted.fields.no_resit, "4321");
        assert!(storage.get_ticket(created.key()).await.unwrap().is_none());

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn in_memory_adapter_serves_dropdowns_and_logs() {
        let db = Database::open_in_memory().await.unwrap();
        let storage = SqliteStorage::from_database(make_config(":memory:"), db);

        let option = DropdownOption {
            kind: "location".into(),
            value: "IPD Shah Alam".into(),
        };
        storage.add_dropdown_option(&option).await.unwrap();
        assert!(storage.list_dropdown_options().await.unwrap().contains(&option));
        assert!(storage.delete_dropdown_option(&option).await.unwrap());

        let page = storage.list_logs(1, 10).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn shutdown_runs_checkpoint() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("shutdown.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        storage.create_ticket(2025, &fields("0001")).await.unwrap();
        storage.shutdown().await.unwrap();
    }
}
