//! Background execution of due scheduled transfers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use super::types::ScheduleOutcome;
use crate::clock::Clock;
use crate::ledger::{LedgerError, LedgerResult};
use crate::ports::Repositories;
use crate::transfer::TransferEngine;

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Due schedules found.
    pub due: usize,
    /// Claims this worker won.
    pub claimed: usize,
    /// Schedules that posted.
    pub executed: usize,
    /// Schedules that ended FAILED.
    pub failed: usize,
    /// Claims given back for a later retry.
    pub released: usize,
    /// Stale claims reset to PENDING before the sweep.
    pub recovered: u64,
}

/// Claims due schedules and runs them through the transfer engine.
///
/// Several runners may sweep the same store: the claim is a compare-and-set,
/// so each schedule executes at most once.
pub struct ScheduleRunner {
    repos: Arc<dyn Repositories>,
    engine: Arc<TransferEngine>,
    clock: Arc<dyn Clock>,
    batch_size: u64,
    claim_timeout: chrono::Duration,
}

impl ScheduleRunner {
    /// Creates a runner.
    #[must_use]
    pub fn new(
        repos: Arc<dyn Repositories>,
        engine: Arc<TransferEngine>,
        clock: Arc<dyn Clock>,
        batch_size: u64,
        claim_timeout: Duration,
    ) -> Self {
        Self {
            repos,
            engine,
            clock,
            batch_size: batch_size.max(1),
            claim_timeout: chrono::Duration::from_std(claim_timeout)
                .unwrap_or(chrono::Duration::minutes(5)),
        }
    }

    /// Processes one batch of due schedules.
    #[instrument(skip(self), err)]
    pub async fn sweep(&self) -> LedgerResult<SweepReport> {
        let now = self.clock.now();
        let mut report = SweepReport {
            recovered: self
                .repos
                .schedules()
                .release_stale_claims(now - self.claim_timeout)
                .await?,
            ..SweepReport::default()
        };
        if report.recovered > 0 {
            warn!(count = report.recovered, "reset stale schedule claims");
        }

        let due = self.repos.schedules().find_due(now, self.batch_size).await?;
        report.due = due.len();

        for schedule in due {
            if !self.repos.schedules().claim(schedule.id, self.clock.now()).await? {
                debug!(schedule_id = %schedule.id, "schedule already claimed");
                continue;
            }
            report.claimed += 1;

            match self.engine.execute_scheduled(&schedule).await {
                Ok(ScheduleOutcome::Executed(_)) => report.executed += 1,
                Ok(ScheduleOutcome::Failed(_)) => report.failed += 1,
                Err(LedgerError::ScheduleNotPending) => {
                    warn!(schedule_id = %schedule.id, "schedule claim lost during execution");
                }
                Err(e) => {
                    warn!(schedule_id = %schedule.id, error = %e, "schedule execution deferred");
                    if let Err(release) = self.repos.schedules().release_claim(schedule.id).await {
                        error!(schedule_id = %schedule.id, error = %release, "failed to release schedule claim");
                    }
                    report.released += 1;
                }
            }
        }

        match self.repos.idempotency().purge_expired(now).await {
            Ok(0) => {}
            Ok(purged) => debug!(purged, "purged expired idempotency records"),
            Err(e) => warn!(error = %e, "failed to purge idempotency records"),
        }

        Ok(report)
    }

    /// Sweeps every `poll_interval` until `shutdown` turns true.
    ///
    /// Shutdown is only observed between batches, never in the middle of a
    /// claimed execution.
    pub async fn run(&self, poll_interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(poll_interval_ms = poll_interval.as_millis(), batch_size = self.batch_size, "scheduler started");
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => {}
            }
            if *shutdown.borrow() {
                break;
            }

            // Keep draining while full batches make progress. A batch whose
            // claims were all given back waits for the next tick.
            loop {
                match self.sweep().await {
                    Ok(report) => {
                        if report.claimed > 0 {
                            info!(
                                executed = report.executed,
                                failed = report.failed,
                                released = report.released,
                                "schedule sweep finished"
                            );
                        }
                        let full = u64::try_from(report.due).unwrap_or(u64::MAX) >= self.batch_size;
                        let progressed = report.executed + report.failed > 0;
                        if !full || !progressed || *shutdown.borrow() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "schedule sweep failed");
                        break;
                    }
                }
            }
        }
        info!("scheduler stopped");
    }
}
