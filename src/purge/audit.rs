use crate::core::{Result, Value};
use crate::schema::{AUDIT_REJECT, LOGGED_AT};
use crate::storage::{Filter, InMemoryStorage};
use chrono::{DateTime, Utc};

/// The secondary aging stream: audit reject/accept records aged by a
/// single timestamp column. No dependents, no shared objects — just the
/// block-delete primitive with its own running total and its own cap.
pub struct AuditPurge<'a> {
    storage: &'a InMemoryStorage,
}

impl<'a> AuditPurge<'a> {
    pub fn new(storage: &'a InMemoryStorage) -> Self {
        Self { storage }
    }

    /// Deletes one block of audit rows inside [from, to), bounded by the
    /// remaining budget. Returns the rows actually removed.
    pub async fn purge_block(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        block_size: usize,
        remaining_budget: u64,
    ) -> Result<u64> {
        if remaining_budget == 0 {
            return Ok(0);
        }
        let limit = block_size.min(remaining_budget.min(usize::MAX as u64) as usize);
        let window = Filter::Range {
            column: LOGGED_AT.to_string(),
            from: Value::Timestamp(from),
            to: Value::Timestamp(to),
        };
        let removed = self
            .storage
            .delete_block(AUDIT_REJECT, &window, Some(LOGGED_AT), Some(limit))
            .await?;
        Ok(removed as u64)
    }

    /// Drains the whole window in bounded blocks, up to `cap` rows.
    pub async fn purge_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        block_size: usize,
        cap: u64,
    ) -> Result<u64> {
        let mut total = 0u64;
        loop {
            let removed = self
                .purge_block(from, to, block_size, cap - total)
                .await?;
            total += removed;
            if removed == 0 || total >= cap {
                break;
            }
        }
        Ok(total)
    }
}
