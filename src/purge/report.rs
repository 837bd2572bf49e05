use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-step row counts for one cascade pass. Handed to the event sink and
/// logged at debug level so operators can see where the rows went.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PassReport {
    /// Root order-history rows removed; the authoritative progress figure.
    pub roots: u64,
    pub dependents: u64,
    pub images: u64,
    pub schedules: u64,
    pub paperwork: u64,
    pub replenishment: u64,
    pub shipping: u64,
    pub orphans: u64,
    /// Patients, prescribers and groups reclaimed after the cascade.
    pub shared: u64,
    /// Secondary-stream rows removed alongside this pass.
    pub audit: u64,
}

impl PassReport {
    pub fn total(&self) -> u64 {
        self.roots
            + self.dependents
            + self.images
            + self.schedules
            + self.paperwork
            + self.replenishment
            + self.shipping
            + self.orphans
            + self.shared
            + self.audit
    }

    /// Progress as the driver sees it: the inner loop stops only when both
    /// streams report zero.
    pub fn stream_progress(&self) -> u64 {
        self.roots + self.audit
    }
}

/// Outcome of one completed engine invocation. Failed runs surface as
/// `Err`; the driver's terminal state is queryable on the driver itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeOutcome {
    pub run_id: Uuid,
    pub root_rows_deleted: u64,
    pub audit_rows_deleted: u64,
    pub passes: u32,
    pub chunks: u32,
}

impl PurgeOutcome {
    pub fn empty(run_id: Uuid) -> Self {
        Self {
            run_id,
            root_rows_deleted: 0,
            audit_rows_deleted: 0,
            passes: 0,
            chunks: 0,
        }
    }
}
