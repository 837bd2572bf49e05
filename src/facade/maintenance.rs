use crate::core::{PurgeError, Result, Row};
use crate::purge::{
    CancelFlag, ChunkDriver, EventSink, PurgeOutcome, PurgeParams, Retention, RetentionConfig,
    TracingSink,
};
use crate::schema::maintenance_catalog;
use crate::storage::{Filter, InMemoryStorage};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Owns the table storage and exposes the maintenance entry points the
/// nightly scheduler calls. The purge engine is one bypassable step among
/// the scheduler's siblings; when disabled, a run succeeds with zero
/// counts instead of touching any table.
pub struct MaintenanceDb {
    storage: InMemoryStorage,
    config: RetentionConfig,
}

impl MaintenanceDb {
    pub async fn bootstrap() -> Result<Self> {
        Self::with_config(RetentionConfig::default()).await
    }

    pub async fn with_config(config: RetentionConfig) -> Result<Self> {
        let storage = InMemoryStorage::new();
        for schema in maintenance_catalog() {
            storage.create_table(schema).await?;
        }
        Ok(Self { storage, config })
    }

    pub fn storage(&self) -> &InMemoryStorage {
        &self.storage
    }

    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }

    /// Parameters with the configured default retention applied.
    pub fn default_params(&self) -> PurgeParams {
        PurgeParams::new(Retention::OlderThanDays(self.config.retention_days))
    }

    pub async fn insert(&self, table: &str, row: Row) -> Result<u64> {
        self.storage.insert_row(table, row).await
    }

    /// Inserts unless a row with the same key value already exists.
    /// Fixture seeding uses this for shared objects referenced by several
    /// orders.
    pub async fn insert_unique(&self, table: &str, key_column: &str, row: Row) -> Result<bool> {
        let schema = self.storage.get_schema(table).await?;
        let idx = schema
            .schema()
            .find_column_index(key_column)
            .ok_or_else(|| {
                PurgeError::ColumnNotFound(key_column.to_string(), table.to_string())
            })?;
        let key = row
            .get(idx)
            .cloned()
            .ok_or_else(|| PurgeError::ConstraintViolation(format!(
                "Row is missing key column '{key_column}'"
            )))?;

        let exists = self
            .storage
            .any_match(table, &Filter::Eq(key_column.to_string(), key))
            .await?;
        if exists {
            return Ok(false);
        }
        self.storage.insert_row(table, row).await?;
        Ok(true)
    }

    pub async fn row_count(&self, table: &str) -> Result<usize> {
        self.storage.row_count(table).await
    }

    /// The scheduler's entry point: honors the enabled flag, uses wall
    /// clock time and the default tracing sink.
    ///
    /// # Examples
    ///
    /// ```
    /// use rxpurge::{MaintenanceDb, PurgeParams, Retention};
    ///
    /// # tokio_test::block_on(async {
    /// let db = MaintenanceDb::bootstrap().await.unwrap();
    ///
    /// let params = PurgeParams::new(Retention::OlderThanDays(365))
    ///     .block_size(500)
    ///     .max_total(10_000);
    /// let outcome = db.run_nightly_purge(&params).await.unwrap();
    /// assert_eq!(outcome.root_rows_deleted, 0);
    /// # });
    /// ```
    pub async fn run_nightly_purge(&self, params: &PurgeParams) -> Result<PurgeOutcome> {
        if !self.config.enabled {
            tracing::info!("purge step disabled; skipping");
            return Ok(PurgeOutcome::empty(Uuid::new_v4()));
        }
        self.run_at(params, Utc::now(), &TracingSink, CancelFlag::new())
            .await
    }

    /// Full-control entry point: explicit clock, sink and cancel flag.
    pub async fn run_at(
        &self,
        params: &PurgeParams,
        now: DateTime<Utc>,
        sink: &dyn EventSink,
        cancel: CancelFlag,
    ) -> Result<PurgeOutcome> {
        let mut driver = ChunkDriver::new(&self.storage, sink).with_cancel(cancel);
        driver.run(params, now).await
    }
}
