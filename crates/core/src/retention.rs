use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::errors::StoreResult;
use crate::store::GiveawayStore;

/// Periodically deletes closed giveaways past their purge deadline.
///
/// Independent of any single giveaway's lifecycle: it reclaims records whose
/// deferred deletion was lost to a restart, and is harmless when that deletion
/// already ran.
pub struct RetentionSweeper {
    store: Arc<dyn GiveawayStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    retention: Duration,
}

impl RetentionSweeper {
    pub fn new(
        store: Arc<dyn GiveawayStore>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        retention: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            interval,
            retention,
        }
    }

    /// Give every closed record without a purge deadline one, measured from
    /// its closure. Returns how many were backfilled.
    pub async fn backfill_once(&self) -> StoreResult<usize> {
        let unscheduled = self.store.list_closed_unscheduled().await?;

        let mut backfilled = 0;
        for record in unscheduled {
            let closed_at = record.closed_at.unwrap_or(record.end_at);
            let purge_at = closed_at.saturating_add(self.retention);
            match self.store.set_purge_at(record.id, purge_at).await {
                Ok(()) => backfilled += 1,
                Err(e) => warn!(giveaway_id = %record.id, "Failed to backfill purge deadline: {}", e),
            }
        }

        if backfilled > 0 {
            info!(backfilled, "Retention sweep backfilled purge deadlines");
        }
        Ok(backfilled)
    }

    /// Run one sweep. Returns how many records this sweep deleted.
    ///
    /// Unscheduled closures are backfilled first, so one whose purge deadline
    /// was never recorded is still reclaimed once retention elapses.
    pub async fn sweep_once(&self) -> StoreResult<usize> {
        if let Err(e) = self.backfill_once().await {
            warn!("Failed to backfill purge deadlines: {}", e);
        }

        let now = self.clock.now();
        let expired = self.store.list_closed_past(now).await?;

        let mut deleted = 0;
        for record in expired {
            match self.store.delete(record.id).await {
                Ok(true) => deleted += 1,
                Ok(false) => debug!(giveaway_id = %record.id, "Expired giveaway already gone"),
                Err(e) => warn!(giveaway_id = %record.id, "Failed to purge expired giveaway: {}", e),
            }
        }

        if deleted > 0 {
            info!(deleted, "Retention sweep purged expired giveaways");
        } else {
            debug!("Retention sweep found nothing to purge");
        }
        Ok(deleted)
    }

    /// Sweep immediately, then every `interval`, until the task is aborted.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval = ?self.interval, "Retention sweeper started");

            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep_once().await {
                    error!("Retention sweep failed: {}", e);
                }
            }
        })
    }
}
