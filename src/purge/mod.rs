mod audit;
mod cascade;
mod driver;
mod params;
mod reclaim;
mod report;
mod selector;
mod sink;

pub use audit::AuditPurge;
pub use cascade::{reclaim_shared, CascadeExecutor};
pub use driver::{CancelFlag, ChunkDriver, DriverState};
pub use params::{PurgeParams, Retention, RetentionConfig};
pub use reclaim::{RefSite, ReferenceChecker};
pub use report::{PassReport, PurgeOutcome};
pub use selector::{Batch, RootSetSelector};
pub use sink::{EventSink, TracingSink};
