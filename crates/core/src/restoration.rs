use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::errors::GiveawayResult;
use crate::lifecycle::{CloseReason, LifecycleManager};
use crate::store::GiveawayStore;

/// What a restoration pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestorationReport {
    /// Open giveaways whose deadline had passed and were closed on the spot.
    pub closed: usize,
    /// Open giveaways re-armed for their remaining time.
    pub armed: usize,
    /// Closed giveaways that were missing a purge deadline.
    pub purge_backfilled: usize,
    /// Overdue giveaways that could not be closed and were re-armed to retry.
    pub failed: usize,
}

/// Rebuilds the lifecycle manager's in-memory timers from the store alone.
/// Runs once at startup, before any create or entry traffic is accepted.
pub struct RestorationService {
    store: Arc<dyn GiveawayStore>,
    manager: Arc<LifecycleManager>,
    clock: Arc<dyn Clock>,
}

impl RestorationService {
    pub fn new(
        store: Arc<dyn GiveawayStore>,
        manager: Arc<LifecycleManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            manager,
            clock,
        }
    }

    pub async fn restore(&self) -> GiveawayResult<RestorationReport> {
        let retry = self.manager.retry_policy();
        let mut report = RestorationReport::default();

        // Deadlines come back from the store already normalized to epoch
        // milliseconds, whatever encoding they were written in.
        let open = retry
            .run("list open giveaways", || self.store.list_open())
            .await?;

        let now = self.clock.now();
        let (overdue, pending): (Vec<_>, Vec<_>) =
            open.into_iter().partition(|record| record.end_at <= now);

        for record in overdue {
            match self.manager.request_close(record.id, CloseReason::Timer).await {
                Ok(_) => report.closed += 1,
                Err(e) => {
                    error!(
                        giveaway_id = %record.id,
                        "Failed to close overdue giveaway during restoration: {}", e
                    );
                    self.manager.arm_in(record.id, retry.max_backoff).await;
                    report.failed += 1;
                }
            }
        }

        for record in pending {
            self.manager.arm(record.id, record.end_at).await;
            report.armed += 1;
        }

        let unscheduled = retry
            .run("list unscheduled closed giveaways", || {
                self.store.list_closed_unscheduled()
            })
            .await?;

        for record in unscheduled {
            let closed_at = record.closed_at.unwrap_or(record.end_at);
            let purge_at = closed_at.saturating_add(self.manager.retention());
            match self.store.set_purge_at(record.id, purge_at).await {
                Ok(()) => report.purge_backfilled += 1,
                Err(e) => warn!(giveaway_id = %record.id, "Failed to backfill purge deadline: {}", e),
            }
        }

        info!(
            closed = report.closed,
            armed = report.armed,
            purge_backfilled = report.purge_backfilled,
            failed = report.failed,
            "Giveaway restoration complete"
        );
        Ok(report)
    }
}
