use super::report::PassReport;
use uuid::Uuid;

/// Event-logging boundary. The nightly scheduler owns the real job log;
/// inside this crate the default sink writes structured tracing events.
pub trait EventSink: Send + Sync {
    fn pass_started(&self, run_id: Uuid, note: &str);
    fn pass_completed(&self, run_id: Uuid, report: &PassReport);
    fn run_failed(&self, run_id: Uuid, code: &str, message: &str);
}

/// Default sink: everything goes to `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn pass_started(&self, run_id: Uuid, note: &str) {
        tracing::info!(%run_id, note, "purge pass started");
    }

    fn pass_completed(&self, run_id: Uuid, report: &PassReport) {
        tracing::info!(
            %run_id,
            roots = report.roots,
            audit = report.audit,
            total = report.total(),
            "purge pass completed"
        );
        tracing::debug!(
            %run_id,
            dependents = report.dependents,
            images = report.images,
            schedules = report.schedules,
            paperwork = report.paperwork,
            replenishment = report.replenishment,
            shipping = report.shipping,
            orphans = report.orphans,
            shared = report.shared,
            "pass breakdown"
        );
    }

    fn run_failed(&self, run_id: Uuid, code: &str, message: &str) {
        tracing::error!(%run_id, code, message, "purge run failed");
    }
}
