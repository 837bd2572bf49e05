use super::audit::AuditPurge;
use super::cascade::{reclaim_shared, CascadeExecutor};
use super::params::PurgeParams;
use super::report::PurgeOutcome;
use super::selector::RootSetSelector;
use super::sink::EventSink;
use crate::core::{PurgeError, Result};
use crate::schema::{AUDIT_REJECT, HIST_TS, LOGGED_AT, ORDER_HIST};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum DriverState {
    Idle,
    SelectingSubrange,
    RunningPass,
    SubrangeExhausted,
    Done,
    Aborted,
}

/// Cooperative stop signal, checked at the top of the inner loop. A pass
/// already underway always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Breaks a wide historical range into fixed-size sub-ranges and drains
/// each one with repeated bounded passes.
///
/// Outer loop: advance the date cursor one chunk at a time. Inner loop:
/// run full passes (select, cascade, reclaim, audit block) until a pass
/// reports zero progress on both streams. A per-chunk pass guard turns
/// unbounded looping into a fatal error instead of a hung run.
pub struct ChunkDriver<'a> {
    storage: &'a crate::storage::InMemoryStorage,
    sink: &'a dyn EventSink,
    cancel: CancelFlag,
    state: DriverState,
}

impl<'a> ChunkDriver<'a> {
    pub fn new(storage: &'a crate::storage::InMemoryStorage, sink: &'a dyn EventSink) -> Self {
        Self {
            storage,
            sink,
            cancel: CancelFlag::new(),
            state: DriverState::Idle,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub async fn run(&mut self, params: &PurgeParams, now: DateTime<Utc>) -> Result<PurgeOutcome> {
        params.validate()?;
        let run_id = Uuid::new_v4();

        match self.drive(run_id, params, now).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.state = DriverState::Aborted;
                self.sink.run_failed(run_id, e.code(), &e.to_string());
                Err(e)
            }
        }
    }

    async fn drive(
        &mut self,
        run_id: Uuid,
        params: &PurgeParams,
        now: DateTime<Utc>,
    ) -> Result<PurgeOutcome> {
        let cutoff = params.retention.cutoff(now);
        let start = match self.range_start(params, cutoff).await? {
            Some(start) => start,
            None => {
                self.state = DriverState::Done;
                return Ok(PurgeOutcome::empty(run_id));
            }
        };

        let mut outcome = PurgeOutcome::empty(run_id);
        let mut cursor = start;
        let selector = RootSetSelector::new(self.storage);
        let cascade = CascadeExecutor::new(self.storage);
        let audit = AuditPurge::new(self.storage);

        'outer: while cursor < cutoff {
            self.state = DriverState::SelectingSubrange;
            let sub_to = cutoff.min(cursor + Duration::days(params.chunk_days));
            outcome.chunks += 1;

            let mut passes_in_chunk = 0u32;
            loop {
                if self.cancel.is_cancelled() {
                    return Err(PurgeError::Cancelled);
                }

                let root_budget = params.max_total - outcome.root_rows_deleted;
                let audit_budget = params.audit_max_total - outcome.audit_rows_deleted;
                if root_budget == 0 && audit_budget == 0 {
                    // Invocation caps hit: the remaining backlog waits for
                    // the next scheduled run.
                    self.state = DriverState::Done;
                    break 'outer;
                }

                passes_in_chunk += 1;
                if passes_in_chunk > params.max_passes_per_chunk {
                    return Err(PurgeError::IterationGuard(format!(
                        "sub-range [{}, {}) still reporting progress after {} passes",
                        cursor, sub_to, params.max_passes_per_chunk
                    )));
                }

                self.state = DriverState::RunningPass;
                self.sink.pass_started(
                    run_id,
                    &json!({
                        "subrange_from": cursor,
                        "subrange_to": sub_to,
                        "block_size": params.block_size,
                        "pass": passes_in_chunk,
                    })
                    .to_string(),
                );

                let block = params.block_size.min(root_budget as usize);
                let mut report = if block > 0 {
                    match selector.next_batch(cursor, sub_to, block).await? {
                        Some(batch) => {
                            let mut report = cascade.purge_batch(&batch).await?;
                            report.shared = reclaim_shared(self.storage, &batch).await?;
                            report
                        }
                        None => Default::default(),
                    }
                } else {
                    Default::default()
                };

                report.audit = audit
                    .purge_block(cursor, sub_to, params.block_size, audit_budget)
                    .await?;

                outcome.root_rows_deleted += report.roots;
                outcome.audit_rows_deleted += report.audit;
                outcome.passes += 1;
                self.sink.pass_completed(run_id, &report);

                if report.stream_progress() == 0 {
                    self.state = DriverState::SubrangeExhausted;
                    break;
                }
            }

            cursor = sub_to;
            if let Some(pause) = params.chunk_pause {
                if cursor < cutoff {
                    tokio::time::sleep(pause).await;
                }
            }
        }

        if self.state != DriverState::Done {
            self.state = DriverState::Done;
        }
        tracing::info!(
            %run_id,
            roots = outcome.root_rows_deleted,
            audit = outcome.audit_rows_deleted,
            passes = outcome.passes,
            chunks = outcome.chunks,
            "purge run complete"
        );
        Ok(outcome)
    }

    /// Lower edge of the wide range: the explicit bound if one was given,
    /// otherwise the oldest timestamp present on either stream.
    async fn range_start(
        &self,
        params: &PurgeParams,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>> {
        if let Some(from) = params.retention.lower_bound() {
            return Ok(if from < cutoff { Some(from) } else { None });
        }

        let oldest_root = self
            .storage
            .min_value(ORDER_HIST, HIST_TS)
            .await?
            .and_then(|v| v.as_timestamp());
        let oldest_audit = self
            .storage
            .min_value(AUDIT_REJECT, LOGGED_AT)
            .await?
            .and_then(|v| v.as_timestamp());

        let start = match (oldest_root, oldest_audit) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        Ok(start.filter(|s| *s < cutoff))
    }
}
