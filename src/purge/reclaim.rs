use crate::core::{Result, Value};
use crate::schema::*;
use crate::storage::{Filter, InMemoryStorage};
use std::collections::HashSet;

/// One place a shared object can be referenced from.
#[derive(Debug, Clone, Copy)]
pub struct RefSite {
    pub table: &'static str,
    pub column: &'static str,
}

/// Reference counting via exclusion: a candidate id survives the check
/// only if no row in any reference site still names it, and only surviving
/// ids are deleted.
///
/// The schema has no enforced foreign keys, so this is the engine's own
/// referential bookkeeping, declared once per shared-object kind instead
/// of duplicating exclusion joins at every call site.
#[derive(Debug)]
pub struct ReferenceChecker {
    pub kind: &'static str,
    key_table: &'static str,
    key_column: &'static str,
    sites: Vec<RefSite>,
}

impl ReferenceChecker {
    fn new(
        kind: &'static str,
        key_table: &'static str,
        key_column: &'static str,
        sites: Vec<RefSite>,
    ) -> Self {
        Self {
            kind,
            key_table,
            key_column,
            sites,
        }
    }

    pub fn patient() -> Self {
        Self::new(
            "patient",
            PATIENT,
            PATIENT_ID,
            vec![
                RefSite { table: ORDER_HIST, column: PATIENT_ID },
                RefSite { table: ORDER_LIVE, column: PATIENT_ID },
                RefSite { table: ORDER_QUEUE, column: PATIENT_ID },
            ],
        )
    }

    pub fn prescriber() -> Self {
        Self::new(
            "prescriber",
            PRESCRIBER,
            PRESCRIBER_ID,
            vec![
                RefSite { table: ORDER_HIST, column: PRESCRIBER_ID },
                RefSite { table: ORDER_LIVE, column: PRESCRIBER_ID },
                RefSite { table: ORDER_QUEUE, column: PRESCRIBER_ID },
            ],
        )
    }

    /// Groups are hierarchical: the parent-group column counts as an
    /// ordinary reference, so a parent survives while any child row names it.
    pub fn group() -> Self {
        Self::new(
            "group",
            RX_GROUP,
            GROUP_NO,
            vec![
                RefSite { table: ORDER_HIST, column: GROUP_NO },
                RefSite { table: ORDER_LIVE, column: GROUP_NO },
                RefSite { table: ORDER_QUEUE, column: GROUP_NO },
                RefSite { table: RX_GROUP, column: PARENT_GROUP_NO },
            ],
        )
    }

    pub fn paperwork() -> Self {
        Self::new(
            "paperwork_set",
            PAPERWORK_SET,
            PAPERWORK_ID,
            vec![RefSite { table: ORDER_PAPERWORK_HIST, column: PAPERWORK_ID }],
        )
    }

    pub fn replenishment() -> Self {
        Self::new(
            "replenishment",
            REPLEN_HIST,
            REPLEN_ID,
            vec![RefSite { table: ORDER_REPLEN_HIST, column: REPLEN_ID }],
        )
    }

    pub fn shipment() -> Self {
        Self::new(
            "shipment",
            SHIPMENT,
            SHIPMENT_ID,
            vec![RefSite { table: ORDER_SHIPMENT_HIST, column: SHIPMENT_ID }],
        )
    }

    pub fn manifest() -> Self {
        Self::new(
            "manifest",
            MANIFEST,
            MANIFEST_ID,
            vec![RefSite { table: SHIPMENT, column: MANIFEST_ID }],
        )
    }

    pub fn pallet() -> Self {
        Self::new(
            "pallet",
            PALLET,
            PALLET_ID,
            vec![RefSite { table: MANIFEST, column: PALLET_ID }],
        )
    }

    pub fn load() -> Self {
        Self::new(
            "load",
            LOAD,
            LOAD_ID,
            vec![RefSite { table: PALLET, column: LOAD_ID }],
        )
    }

    pub fn image() -> Self {
        Self::new(
            "image",
            IMAGE,
            IMAGE_ID,
            vec![
                RefSite { table: ORDER_IMAGE_HIST, column: IMAGE_ID },
                RefSite { table: REPLEN_IMAGE, column: IMAGE_ID },
            ],
        )
    }

    pub fn image_legacy() -> Self {
        Self::new(
            "image_legacy",
            IMAGE_LEGACY,
            IMAGE_NO,
            vec![RefSite { table: ORDER_IMAGE_LEGACY, column: IMAGE_NO }],
        )
    }

    /// Drops from the candidate set every id that still has at least one
    /// referencing row anywhere.
    pub async fn retain_unreferenced(
        &self,
        storage: &InMemoryStorage,
        candidates: &HashSet<Value>,
    ) -> Result<HashSet<Value>> {
        let mut survivors = candidates.clone();
        for site in &self.sites {
            if survivors.is_empty() {
                break;
            }
            let referenced = storage
                .distinct_values(
                    site.table,
                    site.column,
                    &Filter::InList(site.column.to_string(), survivors.clone()),
                )
                .await?;
            survivors.retain(|id| !referenced.contains(id));
        }
        Ok(survivors)
    }

    /// Checks, re-checks, then deletes. The re-check runs on the same
    /// captured candidate set immediately before the delete, closing the
    /// gap between verification and removal.
    pub async fn reclaim(
        &self,
        storage: &InMemoryStorage,
        candidates: &HashSet<Value>,
    ) -> Result<(u64, HashSet<Value>)> {
        self.reclaim_guarded(storage, candidates, None).await
    }

    /// Like [`Self::reclaim`], with an extra row guard on the delete
    /// (used for images, where only externalized rows may be removed).
    pub async fn reclaim_guarded(
        &self,
        storage: &InMemoryStorage,
        candidates: &HashSet<Value>,
        guard: Option<Filter>,
    ) -> Result<(u64, HashSet<Value>)> {
        let survivors = self.retain_unreferenced(storage, candidates).await?;
        if survivors.is_empty() {
            return Ok((0, survivors));
        }
        let survivors = self.retain_unreferenced(storage, &survivors).await?;
        if survivors.is_empty() {
            return Ok((0, survivors));
        }

        let keys = Filter::InList(self.key_column.to_string(), survivors.clone());
        let filter = match guard {
            Some(guard) => Filter::And(vec![keys, guard]),
            None => keys,
        };
        let removed = storage
            .delete_block(self.key_table, &filter, None, None)
            .await?;
        tracing::debug!(
            kind = self.kind,
            candidates = candidates.len(),
            removed,
            "shared-object reclaim"
        );
        Ok((removed as u64, survivors))
    }

    /// Reclaims repeatedly until a sweep frees nothing, so a parent whose
    /// only child died in the same batch is reclaimed in the same pass.
    /// Bounded by the candidate count, which caps any accidental cycle.
    pub async fn reclaim_until_stable(
        &self,
        storage: &InMemoryStorage,
        candidates: &HashSet<Value>,
    ) -> Result<u64> {
        let mut remaining = candidates.clone();
        let mut total = 0u64;
        for _ in 0..=candidates.len() {
            if remaining.is_empty() {
                break;
            }
            let (removed, reclaimed) = self.reclaim(storage, &remaining).await?;
            if removed == 0 {
                break;
            }
            total += removed;
            remaining.retain(|id| !reclaimed.contains(id));
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::maintenance_catalog;
    use chrono::{TimeZone, Utc};

    async fn storage() -> InMemoryStorage {
        let storage = InMemoryStorage::new();
        for schema in maintenance_catalog() {
            storage.create_table(schema).await.unwrap();
        }
        storage
    }

    fn ts(day: u32) -> Value {
        Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_referenced_patient_survives() {
        let storage = storage().await;
        storage
            .insert_row(PATIENT, vec![Value::Integer(1), Value::Text("a".into())])
            .await
            .unwrap();
        storage
            .insert_row(
                ORDER_LIVE,
                vec![
                    Value::Integer(10),
                    Value::Integer(1),
                    Value::Integer(5),
                    Value::Null,
                    Value::Text("open".into()),
                ],
            )
            .await
            .unwrap();

        let candidates: HashSet<Value> = [Value::Integer(1)].into_iter().collect();
        let (removed, _) = ReferenceChecker::patient()
            .reclaim(&storage, &candidates)
            .await
            .unwrap();
        assert_eq!(removed, 0);
        assert_eq!(storage.row_count(PATIENT).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unreferenced_patient_reclaimed() {
        let storage = storage().await;
        storage
            .insert_row(PATIENT, vec![Value::Integer(1), Value::Text("a".into())])
            .await
            .unwrap();

        let candidates: HashSet<Value> = [Value::Integer(1)].into_iter().collect();
        let (removed, _) = ReferenceChecker::patient()
            .reclaim(&storage, &candidates)
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(storage.row_count(PATIENT).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_parent_group_kept_while_child_exists() {
        let storage = storage().await;
        storage
            .insert_row(RX_GROUP, vec![Value::Integer(1), Value::Null])
            .await
            .unwrap();
        storage
            .insert_row(RX_GROUP, vec![Value::Integer(2), Value::Integer(1)])
            .await
            .unwrap();
        // Child group 2 is still referenced by a historical order.
        storage
            .insert_row(
                ORDER_HIST,
                vec![
                    Value::Integer(10),
                    ts(1),
                    Value::Integer(1),
                    Value::Integer(1),
                    Value::Integer(2),
                    Value::Text("done".into()),
                ],
            )
            .await
            .unwrap();

        let candidates: HashSet<Value> =
            [Value::Integer(1), Value::Integer(2)].into_iter().collect();
        let removed = ReferenceChecker::group()
            .reclaim_until_stable(&storage, &candidates)
            .await
            .unwrap();
        assert_eq!(removed, 0);
        assert_eq!(storage.row_count(RX_GROUP).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_group_chain_reclaimed_bottom_up() {
        let storage = storage().await;
        // Parent 1 <- child 2 <- grandchild 3, nothing else references them.
        storage
            .insert_row(RX_GROUP, vec![Value::Integer(1), Value::Null])
            .await
            .unwrap();
        storage
            .insert_row(RX_GROUP, vec![Value::Integer(2), Value::Integer(1)])
            .await
            .unwrap();
        storage
            .insert_row(RX_GROUP, vec![Value::Integer(3), Value::Integer(2)])
            .await
            .unwrap();

        let candidates: HashSet<Value> = [1i64, 2, 3].map(Value::Integer).into_iter().collect();
        let removed = ReferenceChecker::group()
            .reclaim_until_stable(&storage, &candidates)
            .await
            .unwrap();
        assert_eq!(removed, 3);
        assert_eq!(storage.row_count(RX_GROUP).await.unwrap(), 0);
    }
}
