use crate::core::{PurgeError, Result, Value};
use crate::schema::*;
use crate::storage::{Filter, InMemoryStorage};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// One bounded working set of root identifiers, materialized in full
/// before the first delete of the pass.
///
/// Shared-object candidate ids are captured here because some of them are
/// only derivable from dependent rows that the cascade is about to remove.
#[derive(Debug, Default)]
pub struct Batch {
    /// (order_id, hist_ts) pairs, oldest-first.
    pub root_keys: Vec<(Value, Value)>,
    pub order_ids: HashSet<Value>,

    // Candidates from the root rows themselves.
    pub patient_ids: HashSet<Value>,
    pub prescriber_ids: HashSet<Value>,
    pub group_nos: HashSet<Value>,

    // Candidates from dependent rows, read before those rows are deleted.
    pub schedule_ids: HashSet<Value>,
    pub paperwork_ids: HashSet<Value>,
    pub replen_ids: HashSet<Value>,
    pub replen_image_ids: HashSet<Value>,
    pub shipment_ids: HashSet<Value>,
    pub image_ids: HashSet<Value>,
    pub legacy_image_nos: HashSet<Value>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.root_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root_keys.is_empty()
    }

    /// Composite-key filter matching this batch's roots in any table keyed
    /// by (order_id, hist_ts).
    pub fn key_filter(&self) -> Filter {
        let pairs: HashSet<(Value, Value)> = self.root_keys.iter().cloned().collect();
        Filter::InPairs(ORDER_ID.to_string(), HIST_TS.to_string(), pairs)
    }
}

/// Picks the oldest unprocessed block of roots inside a window and
/// captures every identifier the cascade and the reclaimer will need.
pub struct RootSetSelector<'a> {
    storage: &'a InMemoryStorage,
}

impl<'a> RootSetSelector<'a> {
    pub fn new(storage: &'a InMemoryStorage) -> Self {
        Self { storage }
    }

    /// Returns `None` when no roots remain in [from, to).
    pub async fn next_batch(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        block_size: usize,
    ) -> Result<Option<Batch>> {
        let window = Filter::Range {
            column: HIST_TS.to_string(),
            from: Value::Timestamp(from),
            to: Value::Timestamp(to),
        };

        let schema = self.storage.get_schema(ORDER_HIST).await?;
        let col = |name: &str| -> Result<usize> {
            schema
                .schema()
                .find_column_index(name)
                .ok_or_else(|| PurgeError::ColumnNotFound(name.to_string(), ORDER_HIST.to_string()))
        };
        let order_idx = col(ORDER_ID)?;
        let ts_idx = col(HIST_TS)?;
        let patient_idx = col(PATIENT_ID)?;
        let prescriber_idx = col(PRESCRIBER_ID)?;
        let group_idx = col(GROUP_NO)?;

        let mut roots = self.storage.scan_filtered(ORDER_HIST, &window).await?;
        if roots.is_empty() {
            return Ok(None);
        }

        // Strictly oldest-to-newest: a partially executed run leaves the
        // remaining backlog entirely newer than what was removed.
        roots.sort_by(|a, b| {
            a[ts_idx]
                .compare(&b[ts_idx])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        roots.truncate(block_size);

        let mut batch = Batch::default();
        for row in &roots {
            batch
                .root_keys
                .push((row[order_idx].clone(), row[ts_idx].clone()));
            batch.order_ids.insert(row[order_idx].clone());
            batch.patient_ids.insert(row[patient_idx].clone());
            batch.prescriber_ids.insert(row[prescriber_idx].clone());
            if !row[group_idx].is_null() {
                batch.group_nos.insert(row[group_idx].clone());
            }
        }

        let keys = batch.key_filter();
        batch.schedule_ids = self
            .storage
            .distinct_values(SCHEDULE_HIST, SCHEDULE_ID, &keys)
            .await?;
        batch.paperwork_ids = self
            .storage
            .distinct_values(ORDER_PAPERWORK_HIST, PAPERWORK_ID, &keys)
            .await?;
        batch.replen_ids = self
            .storage
            .distinct_values(ORDER_REPLEN_HIST, REPLEN_ID, &keys)
            .await?;
        batch.shipment_ids = self
            .storage
            .distinct_values(ORDER_SHIPMENT_HIST, SHIPMENT_ID, &keys)
            .await?;
        batch.image_ids = self
            .storage
            .distinct_values(ORDER_IMAGE_HIST, IMAGE_ID, &keys)
            .await?;
        batch.legacy_image_nos = self
            .storage
            .distinct_values(ORDER_IMAGE_LEGACY, IMAGE_NO, &keys)
            .await?;

        // Replenishment images hang off the replenishment key, not the
        // order key, so they need the intermediate set captured first.
        if !batch.replen_ids.is_empty() {
            batch.replen_image_ids = self
                .storage
                .distinct_values(
                    REPLEN_IMAGE,
                    IMAGE_ID,
                    &Filter::InList(REPLEN_ID.to_string(), batch.replen_ids.clone()),
                )
                .await?;
        }

        Ok(Some(batch))
    }
}
