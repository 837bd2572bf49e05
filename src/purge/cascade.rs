use super::reclaim::ReferenceChecker;
use super::report::PassReport;
use super::selector::Batch;
use crate::core::{PurgeError, Result, Value};
use crate::schema::*;
use crate::storage::{Filter, InMemoryStorage};
use std::collections::HashSet;

/// Executes the fixed-order dependency cascade for one batch.
///
/// Children are always removed before their parent, and the shipment chain
/// is un-referenced bottom-up: each level's eligibility depends on the
/// level below already being gone. Every step commits in its own lock
/// scope; a mid-cascade failure leaves earlier steps committed, which the
/// oldest-first ordering makes safe to resume.
pub struct CascadeExecutor<'a> {
    storage: &'a InMemoryStorage,
}

impl<'a> CascadeExecutor<'a> {
    pub fn new(storage: &'a InMemoryStorage) -> Self {
        Self { storage }
    }

    pub async fn purge_batch(&self, batch: &Batch) -> Result<PassReport> {
        let mut report = PassReport::default();
        let keys = batch.key_filter();

        // 1. Simple owned dependents keyed by (order_id, hist_ts).
        for table in OWNED_DEPENDENT_TABLES {
            report.dependents += self.delete("owned-dependents", table, &keys).await?;
        }

        // 2. Image associations, then the images themselves. Rows not yet
        // externalized to durable storage stay behind.
        report.images += self.delete("images", ORDER_IMAGE_HIST, &keys).await?;
        report.images += self.delete("images", ORDER_IMAGE_LEGACY, &keys).await?;
        report.images += self
            .reclaim_images(&ReferenceChecker::image(), &batch.image_ids)
            .await?;
        report.images += self
            .reclaim_images(&ReferenceChecker::image_legacy(), &batch.legacy_image_nos)
            .await?;

        // 3. Dose-schedule trees: detail rows before the header.
        if !batch.schedule_ids.is_empty() {
            let schedule_keys =
                Filter::InList(SCHEDULE_ID.to_string(), batch.schedule_ids.clone());
            report.schedules += self.delete("schedules", SCHEDULE_DOSE, &schedule_keys).await?;
            report.schedules += self.delete("schedules", SCHEDULE_DAY, &schedule_keys).await?;
        }
        report.schedules += self.delete("schedules", SCHEDULE_HIST, &keys).await?;

        // 4. Paperwork associations, then the set row once nothing
        // references it anywhere.
        report.paperwork += self.delete("paperwork", ORDER_PAPERWORK_HIST, &keys).await?;
        let (removed, _) = ReferenceChecker::paperwork()
            .reclaim(self.storage, &batch.paperwork_ids)
            .await?;
        report.paperwork += removed;

        // 5. Canister replenishment.
        report.replenishment += self.delete("replenishment", ORDER_REPLEN_HIST, &keys).await?;
        let (removed, reclaimed) = ReferenceChecker::replenishment()
            .reclaim(self.storage, &batch.replen_ids)
            .await?;
        report.replenishment += removed;
        if !reclaimed.is_empty() {
            let replen_keys = Filter::InList(REPLEN_ID.to_string(), reclaimed);
            report.replenishment += self
                .delete("replenishment", REPLEN_LOT_HIST, &replen_keys)
                .await?;
            report.replenishment += self
                .delete("replenishment", REPLEN_IMAGE, &replen_keys)
                .await?;
        }
        report.replenishment += self
            .reclaim_images(&ReferenceChecker::image(), &batch.replen_image_ids)
            .await?;

        // 6. Shipment graph.
        report.shipping += self.shipping_step(batch).await?;

        // 7. The root rows. This count feeds the cumulative cap and the
        // resumability watermark.
        report.roots = self.delete("root", ORDER_HIST, &keys).await?;

        // 8. Tables keyed by order id alone: removable only when neither a
        // live nor a historical row still carries the id.
        report.orphans = self.orphan_step(batch).await?;

        Ok(report)
    }

    async fn shipping_step(&self, batch: &Batch) -> Result<u64> {
        let keys = batch.key_filter();
        let mut removed = self.delete("shipping", ORDER_SHIPMENT_HIST, &keys).await?;

        if !batch.shipment_ids.is_empty() {
            let shipment_keys =
                Filter::InList(SHIPMENT_ID.to_string(), batch.shipment_ids.clone());
            for table in SHIPMENT_DETAIL_TABLES {
                removed += self.delete("shipping", table, &shipment_keys).await?;
            }
        }

        // Walk the chain bottom-up: shipment, then manifest, pallet, load.
        // Each level's parent ids are captured from the rows about to be
        // reclaimed, before those rows disappear.
        let shipment = ReferenceChecker::shipment();
        let eligible = shipment
            .retain_unreferenced(self.storage, &batch.shipment_ids)
            .await?;
        let manifest_ids = self
            .parent_ids(SHIPMENT, SHIPMENT_ID, MANIFEST_ID, &eligible)
            .await?;
        let (n, _) = shipment.reclaim(self.storage, &eligible).await?;
        removed += n;

        let manifest = ReferenceChecker::manifest();
        let eligible = manifest
            .retain_unreferenced(self.storage, &manifest_ids)
            .await?;
        let pallet_ids = self
            .parent_ids(MANIFEST, MANIFEST_ID, PALLET_ID, &eligible)
            .await?;
        let (n, _) = manifest.reclaim(self.storage, &eligible).await?;
        removed += n;

        let pallet = ReferenceChecker::pallet();
        let eligible = pallet.retain_unreferenced(self.storage, &pallet_ids).await?;
        let load_ids = self
            .parent_ids(PALLET, PALLET_ID, LOAD_ID, &eligible)
            .await?;
        let (n, _) = pallet.reclaim(self.storage, &eligible).await?;
        removed += n;

        let (n, _) = ReferenceChecker::load()
            .reclaim(self.storage, &load_ids)
            .await?;
        removed += n;

        Ok(removed)
    }

    async fn orphan_step(&self, batch: &Batch) -> Result<u64> {
        if batch.order_ids.is_empty() {
            return Ok(0);
        }
        let id_filter = Filter::InList(ORDER_ID.to_string(), batch.order_ids.clone());
        let live = self
            .storage
            .distinct_values(ORDER_LIVE, ORDER_ID, &id_filter)
            .await?;
        let hist = self
            .storage
            .distinct_values(ORDER_HIST, ORDER_ID, &id_filter)
            .await?;

        let orphans: HashSet<Value> = batch
            .order_ids
            .iter()
            .filter(|id| !live.contains(id) && !hist.contains(id))
            .cloned()
            .collect();
        if orphans.is_empty() {
            return Ok(0);
        }

        let orphan_filter = Filter::InList(ORDER_ID.to_string(), orphans);
        let mut removed = 0u64;
        for table in ID_ONLY_TABLES {
            removed += self.delete("orphan-cleanup", table, &orphan_filter).await?;
        }
        Ok(removed)
    }

    async fn reclaim_images(
        &self,
        checker: &ReferenceChecker,
        candidates: &HashSet<Value>,
    ) -> Result<u64> {
        let guard = Filter::Eq(ARCHIVED.to_string(), Value::Boolean(true));
        let (removed, _) = checker
            .reclaim_guarded(self.storage, candidates, Some(guard))
            .await?;
        Ok(removed)
    }

    async fn parent_ids(
        &self,
        table: &str,
        key_column: &str,
        parent_column: &str,
        keys: &HashSet<Value>,
    ) -> Result<HashSet<Value>> {
        if keys.is_empty() {
            return Ok(HashSet::new());
        }
        self.storage
            .distinct_values(
                table,
                parent_column,
                &Filter::InList(key_column.to_string(), keys.clone()),
            )
            .await
    }

    async fn delete(&self, step: &'static str, table: &str, filter: &Filter) -> Result<u64> {
        self.storage
            .delete_block(table, filter, None, None)
            .await
            .map(|n| n as u64)
            .map_err(|e| PurgeError::DeleteFailed {
                table: table.to_string(),
                step: step.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Shared-object reclamation for the people/container candidates captured
/// with the batch. Runs strictly after the cascade, since the cascade's
/// deletions are what can make a candidate eligible.
pub async fn reclaim_shared(storage: &InMemoryStorage, batch: &Batch) -> Result<u64> {
    let mut removed = ReferenceChecker::group()
        .reclaim_until_stable(storage, &batch.group_nos)
        .await?;
    let (n, _) = ReferenceChecker::patient()
        .reclaim(storage, &batch.patient_ids)
        .await?;
    removed += n;
    let (n, _) = ReferenceChecker::prescriber()
        .reclaim(storage, &batch.prescriber_ids)
        .await?;
    removed += n;
    Ok(removed)
}
