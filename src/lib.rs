// ============================================================================
// rxpurge — bounded cascading reclamation for aged pharmacy order history
// ============================================================================
//
// Retires completed order-history records together with everything they
// exclusively own, reclaims shared objects (patients, prescribers, groups,
// shipment graph, images, paperwork, replenishment records) only once no
// referencing row remains anywhere, and bounds every delete so an
// arbitrarily large backlog can be drained safely across many scheduled
// runs.

pub mod core;
pub mod facade;
pub mod purge;
pub mod schema;
pub mod storage;

// Re-export main types for convenience
pub use crate::core::{DataType, PurgeError, Result, Value};
pub use facade::MaintenanceDb;
pub use purge::{
    CancelFlag, DriverState, EventSink, PassReport, PurgeOutcome, PurgeParams, Retention,
    RetentionConfig, TracingSink,
};
