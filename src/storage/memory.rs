use super::{Filter, Table, TableSchema};
use crate::core::{PurgeError, Result, Row, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Named tables, each behind its own lock so one table's delete never
/// blocks readers of another.
pub struct InMemoryStorage {
    tables: RwLock<HashMap<String, Arc<RwLock<Table>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_table(&self, schema: TableSchema) -> Result<()> {
        let name = schema.name().to_string();
        let mut tables = self.tables.write().await;

        if tables.contains_key(&name) {
            return Err(PurgeError::TableExists(name));
        }

        tables.insert(name, Arc::new(RwLock::new(Table::new(schema))));
        Ok(())
    }

    pub async fn get_table(&self, name: &str) -> Result<Arc<RwLock<Table>>> {
        self.tables
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| PurgeError::TableNotFound(name.to_string()))
    }

    pub async fn table_exists(&self, name: &str) -> bool {
        self.tables.read().await.contains_key(name)
    }

    pub async fn list_tables(&self) -> Vec<String> {
        self.tables.read().await.keys().cloned().collect()
    }

    pub async fn insert_row(&self, table_name: &str, row: Row) -> Result<u64> {
        let table_handle = self.get_table(table_name).await?;
        let mut table = table_handle.write().await;
        table.insert(row)
    }

    pub async fn scan_filtered(&self, table_name: &str, filter: &Filter) -> Result<Vec<Row>> {
        let table_handle = self.get_table(table_name).await?;
        let table = table_handle.read().await;
        table.scan_filtered(filter)
    }

    pub async fn any_match(&self, table_name: &str, filter: &Filter) -> Result<bool> {
        let table_handle = self.get_table(table_name).await?;
        let table = table_handle.read().await;
        table.any_match(filter)
    }

    pub async fn distinct_values(
        &self,
        table_name: &str,
        column: &str,
        filter: &Filter,
    ) -> Result<HashSet<Value>> {
        let table_handle = self.get_table(table_name).await?;
        let table = table_handle.read().await;
        table.distinct_values(column, filter)
    }

    pub async fn min_value(&self, table_name: &str, column: &str) -> Result<Option<Value>> {
        let table_handle = self.get_table(table_name).await?;
        let table = table_handle.read().await;
        table.min_value(column)
    }

    /// Block-delete primitive: one write-lock scope, at most `limit`
    /// matching rows, oldest-first by `order_by`. The returned count is the
    /// number of rows actually removed, which can be below the limit on the
    /// final block.
    pub async fn delete_block(
        &self,
        table_name: &str,
        filter: &Filter,
        order_by: Option<&str>,
        limit: Option<usize>,
    ) -> Result<usize> {
        let table_handle = self.get_table(table_name).await?;
        let mut table = table_handle.write().await;
        table.delete_where(filter, order_by, limit)
    }

    pub async fn get_schema(&self, table_name: &str) -> Result<TableSchema> {
        let table_handle = self.get_table(table_name).await?;
        let table = table_handle.read().await;
        Ok(table.schema().clone())
    }

    pub async fn row_count(&self, table_name: &str) -> Result<usize> {
        let table_handle = self.get_table(table_name).await?;
        let table = table_handle.read().await;
        Ok(table.row_count())
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}
