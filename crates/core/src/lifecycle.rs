//! The `Open -> Closed` state machine.
//!
//! [`LifecycleManager`] owns one deadline timer per open giveaway and one
//! deferred purge per closed giveaway. Both registries are caches of what needs
//! to fire when; the store stays authoritative and
//! [`RestorationService`](crate::restoration::RestorationService) can rebuild
//! the deadline timers from it alone.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::errors::{GiveawayError, GiveawayResult};
use crate::models::{GiveawayId, GiveawayRecord, GiveawayStatus, NewGiveaway, ParticipantId, Timestamp};
use crate::notifier::Notifier;
use crate::selector::WinnerSelector;
use crate::store::{CloseOutcome, GiveawayStore};

pub mod registry;
pub mod retry;

pub use registry::{TimerCallback, TimerRegistry};
pub use retry::RetryPolicy;

pub type ArmFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Redraws allowed when joins keep landing between snapshot and closure.
const MAX_REDRAWS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Timer,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseResult {
    /// This call performed the closure.
    Closed { winners: Vec<ParticipantId> },
    /// Someone else already closed it; nothing was done.
    AlreadyClosed,
}

pub struct LifecycleManager {
    this: Weak<LifecycleManager>,
    store: Arc<dyn GiveawayStore>,
    notifier: Arc<dyn Notifier>,
    selector: WinnerSelector,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    retention: Duration,
    deadlines: TimerRegistry,
    purges: TimerRegistry,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn GiveawayStore>,
        notifier: Arc<dyn Notifier>,
        selector: WinnerSelector,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
        retention: Duration,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            store,
            notifier,
            selector,
            clock,
            retry,
            retention,
            deadlines: TimerRegistry::new("deadline"),
            purges: TimerRegistry::new("purge"),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Validate, persist and arm a new giveaway.
    pub async fn create(&self, new: NewGiveaway) -> GiveawayResult<GiveawayRecord> {
        let now = self.clock.now();
        new.validate(now)?;

        let mut record = self.store.create_record(&new, now).await?;
        self.arm(record.id, record.end_at).await;
        info!(
            giveaway_id = %record.id,
            prize = %record.prize,
            winner_count = record.winner_count,
            end_at = %record.end_at,
            "Giveaway created"
        );

        match self.notifier.announce_open(&record).await {
            Ok(Some(message_ref)) => {
                match self.store.set_message_ref(record.id, &message_ref).await {
                    Ok(()) => record.message_ref = Some(message_ref),
                    Err(e) => warn!(giveaway_id = %record.id, "Failed to record message reference: {}", e),
                }
            }
            Ok(None) => {}
            Err(e) => warn!(giveaway_id = %record.id, "Failed to announce giveaway: {}", e),
        }

        Ok(record)
    }

    /// Arm the deadline timer for `id` to fire at `end_at`.
    pub async fn arm(&self, id: GiveawayId, end_at: Timestamp) {
        let delay = self.clock.now().duration_until(end_at);
        self.arm_in(id, delay).await;
    }

    /// Arm the deadline timer for `id` to fire after `delay`.
    ///
    /// Boxed: a failed deadline close re-arms through here.
    pub fn arm_in(&self, id: GiveawayId, delay: Duration) -> ArmFuture<'_> {
        let this = self.this.clone();
        Box::pin(async move {
            self.deadlines
                .register(
                    id,
                    delay,
                    Box::pin(async move {
                        if let Some(manager) = this.upgrade() {
                            manager.on_deadline(id).await;
                        }
                    }),
                )
                .await;
            debug!(giveaway_id = %id, ?delay, "Deadline timer armed");
        })
    }

    pub async fn is_armed(&self, id: GiveawayId) -> bool {
        self.deadlines.contains(id).await
    }

    pub async fn armed_count(&self) -> usize {
        self.deadlines.len().await
    }

    pub async fn pending_purge_count(&self) -> usize {
        self.purges.len().await
    }

    async fn on_deadline(&self, id: GiveawayId) {
        if let Err(e) = self.request_close(id, CloseReason::Timer).await {
            match e {
                GiveawayError::NotFound(_) => {
                    warn!(giveaway_id = %id, "Deadline fired for a giveaway that no longer exists");
                }
                e => {
                    error!(
                        giveaway_id = %id,
                        "Failed to close giveaway at its deadline, re-arming: {}", e
                    );
                    self.arm_in(id, self.retry.max_backoff).await;
                }
            }
        }
    }

    /// Close `id` if it is still open. Safe to call from both the deadline
    /// timer and a manual "end now"; whichever runs second is a no-op.
    pub async fn request_close(
        &self,
        id: GiveawayId,
        reason: CloseReason,
    ) -> GiveawayResult<CloseResult> {
        for _ in 0..MAX_REDRAWS {
            let record = self
                .retry
                .run("load giveaway", || self.store.get_by_id(id))
                .await?
                .ok_or(GiveawayError::NotFound(id))?;

            if record.status == GiveawayStatus::Closed {
                self.deadlines.cancel(id).await;
                debug!(giveaway_id = %id, ?reason, "Giveaway already closed");
                return Ok(CloseResult::AlreadyClosed);
            }

            let snapshot = record.participants.clone();
            let winners = self.selector.draw(&snapshot, record.winner_count);
            let closed_at = self.clock.now();

            let mut attempts = 0u32;
            let outcome = self
                .retry
                .run("persist giveaway closure", || {
                    attempts += 1;
                    self.store.mark_closed(id, &snapshot, &winners, closed_at)
                })
                .await
                .inspect_err(|e| {
                    error!(giveaway_id = %id, "Giveaway closure could not be persisted: {}", e)
                })?;

            match outcome {
                CloseOutcome::Closed => {
                    self.deadlines.cancel(id).await;
                    let closed = GiveawayRecord {
                        status: GiveawayStatus::Closed,
                        closed_at: Some(closed_at),
                        winners: winners.clone(),
                        ..record
                    };
                    info!(
                        giveaway_id = %id,
                        ?reason,
                        participants = closed.participants.len(),
                        winners = winners.len(),
                        "Giveaway closed"
                    );

                    self.announce_closure(&closed).await;
                    self.schedule_purge(id, closed_at).await;
                    return Ok(CloseResult::Closed { winners });
                }
                CloseOutcome::AlreadyClosed if attempts > 1 => {
                    // An earlier attempt may have committed before its reply was lost.
                    self.deadlines.cancel(id).await;
                    return self.settle_ambiguous_close(id, reason, &winners, closed_at).await;
                }
                CloseOutcome::AlreadyClosed => {
                    self.deadlines.cancel(id).await;
                    debug!(giveaway_id = %id, ?reason, "Giveaway closed concurrently");
                    return Ok(CloseResult::AlreadyClosed);
                }
                CloseOutcome::Stale => {
                    debug!(giveaway_id = %id, "Participants changed during the draw, redrawing");
                }
                CloseOutcome::NotFound => {
                    self.deadlines.cancel(id).await;
                    return Err(GiveawayError::NotFound(id));
                }
            }
        }

        Err(GiveawayError::Contended(id))
    }

    /// Resolve a retried closure that came back `AlreadyClosed`. If the stored
    /// closure is the one this call drew, finish it as ours. Either way the
    /// record must leave here with a purge deadline.
    async fn settle_ambiguous_close(
        &self,
        id: GiveawayId,
        reason: CloseReason,
        winners: &[ParticipantId],
        closed_at: Timestamp,
    ) -> GiveawayResult<CloseResult> {
        let record = self
            .retry
            .run("reload closed giveaway", || self.store.get_by_id(id))
            .await?
            .ok_or(GiveawayError::NotFound(id))?;

        if record.closed_at == Some(closed_at) && record.winners == winners {
            info!(
                giveaway_id = %id,
                ?reason,
                participants = record.participants.len(),
                winners = winners.len(),
                "Giveaway closed (acknowledgement was lost)"
            );
            self.announce_closure(&record).await;
            if record.purge_at.is_none() {
                self.schedule_purge(id, closed_at).await;
            }
            return Ok(CloseResult::Closed {
                winners: winners.to_vec(),
            });
        }

        debug!(giveaway_id = %id, ?reason, "Giveaway closed concurrently");
        if record.purge_at.is_none() {
            self.schedule_purge(id, record.closed_at.unwrap_or(record.end_at))
                .await;
        }
        Ok(CloseResult::AlreadyClosed)
    }

    async fn announce_closure(&self, record: &GiveawayRecord) {
        let result = if record.winners.is_empty() {
            self.notifier.announce_no_participants(record).await
        } else {
            self.notifier.announce_closed(record, &record.winners).await
        };

        if let Err(e) = result {
            warn!(giveaway_id = %record.id, "Failed to announce giveaway results: {}", e);
        }
    }

    /// Record the purge deadline and arm the single-shot deletion. The
    /// retention sweeper reclaims the record if this process dies first.
    async fn schedule_purge(&self, id: GiveawayId, closed_at: Timestamp) {
        let purge_at = closed_at.saturating_add(self.retention);
        if let Err(e) = self
            .retry
            .run("record purge deadline", || self.store.set_purge_at(id, purge_at))
            .await
        {
            warn!(giveaway_id = %id, "Failed to record purge deadline: {}", e);
        }

        let delay = self.clock.now().duration_until(purge_at);
        let this = self.this.clone();
        self.purges
            .register(
                id,
                delay,
                Box::pin(async move {
                    if let Some(manager) = this.upgrade() {
                        manager.purge(id).await;
                    }
                }),
            )
            .await;
        debug!(giveaway_id = %id, purge_at = %purge_at, "Purge scheduled");
    }

    async fn purge(&self, id: GiveawayId) {
        match self.store.delete(id).await {
            Ok(true) => info!(giveaway_id = %id, "Giveaway purged"),
            Ok(false) => debug!(giveaway_id = %id, "Giveaway already purged"),
            Err(e) => warn!(giveaway_id = %id, "Deferred purge failed, leaving it to the sweeper: {}", e),
        }
    }

    /// Abort every in-memory timer. Returns how many deadline timers were pending.
    pub async fn shutdown(&self) -> usize {
        let deadlines = self.deadlines.cancel_all().await;
        let purges = self.purges.cancel_all().await;
        info!(deadlines, purges, "Lifecycle timers cancelled");
        deadlines
    }
}
