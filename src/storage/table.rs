use super::Filter;
use crate::core::{Column, PurgeError, Result, Row, Schema, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    schema: TableSchema,
    rows: BTreeMap<u64, Row>,
    next_row_id: u64,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            next_row_id: 0,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn insert(&mut self, row: Row) -> Result<u64> {
        self.validate_row(&row)?;

        let id = self.next_row_id;
        self.next_row_id += 1;

        self.rows.insert(id, row);

        Ok(id)
    }

    pub fn scan(&self) -> Vec<Row> {
        self.rows.values().cloned().collect()
    }

    pub fn scan_filtered(&self, filter: &Filter) -> Result<Vec<Row>> {
        let mut results = Vec::new();
        for row in self.rows.values() {
            if filter.matches(row, self.schema.schema())? {
                results.push(row.clone());
            }
        }
        Ok(results)
    }

    /// Early-exit existence probe, used by the reference checker.
    pub fn any_match(&self, filter: &Filter) -> Result<bool> {
        for row in self.rows.values() {
            if filter.matches(row, self.schema.schema())? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Distinct non-NULL values of one column over the matching rows.
    pub fn distinct_values(&self, column: &str, filter: &Filter) -> Result<HashSet<Value>> {
        let idx = self.column_index(column)?;
        let mut values = HashSet::new();
        for row in self.rows.values() {
            if filter.matches(row, self.schema.schema())? {
                let value = &row[idx];
                if !value.is_null() {
                    values.insert(value.clone());
                }
            }
        }
        Ok(values)
    }

    /// Smallest non-NULL value of a column, or None on an empty table.
    pub fn min_value(&self, column: &str) -> Result<Option<Value>> {
        let idx = self.column_index(column)?;
        let mut min: Option<Value> = None;
        for row in self.rows.values() {
            let value = &row[idx];
            if value.is_null() {
                continue;
            }
            match &min {
                None => min = Some(value.clone()),
                Some(current) => {
                    if value.compare(current)? == std::cmp::Ordering::Less {
                        min = Some(value.clone());
                    }
                }
            }
        }
        Ok(min)
    }

    /// Deletes at most `limit` matching rows, oldest-first by `order_by`
    /// when given. Returns the exact number of rows removed; callers must
    /// advance running totals by this count, never by the requested limit.
    pub fn delete_where(
        &mut self,
        filter: &Filter,
        order_by: Option<&str>,
        limit: Option<usize>,
    ) -> Result<usize> {
        let mut matched: Vec<(u64, Row)> = Vec::new();
        for (id, row) in &self.rows {
            if filter.matches(row, self.schema.schema())? {
                matched.push((*id, row.clone()));
            }
        }

        if let Some(column) = order_by {
            let idx = self.column_index(column)?;
            matched.sort_by(|(_, a), (_, b)| {
                a[idx]
                    .compare(&b[idx])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        if let Some(limit) = limit {
            matched.truncate(limit);
        }

        for (id, _) in &matched {
            self.rows.remove(id);
        }

        Ok(matched.len())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_index(&self, column: &str) -> Result<usize> {
        self.schema.schema().find_column_index(column).ok_or_else(|| {
            PurgeError::ColumnNotFound(column.to_string(), self.schema.name().to_string())
        })
    }

    fn validate_row(&self, row: &Row) -> Result<()> {
        let columns = self.schema.schema().columns();
        if row.len() != columns.len() {
            return Err(PurgeError::ConstraintViolation(format!(
                "Table '{}' expects {} columns, got {}",
                self.schema.name(),
                columns.len(),
                row.len()
            )));
        }
        for (column, value) in columns.iter().zip(row.iter()) {
            column.validate(value)?;
        }
        Ok(())
    }

}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    schema: Schema,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            schema: Schema::new(columns),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}
