#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use giveaways_core::clock::Clock;
use giveaways_core::config::EngineConfig;
use giveaways_core::errors::{EntryError, NotifyError, StoreError, StoreResult};
use giveaways_core::lifecycle::RetryPolicy;
use giveaways_core::models::{
    GiveawayId, GiveawayRecord, GiveawayStatus, NewGiveaway, ParticipantId, ParticipantSet,
    Timestamp,
};
use giveaways_core::notifier::Notifier;
use giveaways_core::store::{
    CloseOutcome, GiveawayStore, MemoryStore, ParticipantMutator, UpdateOutcome,
};

/// 2024-01-01T00:00:00Z
pub const EPOCH: Timestamp = Timestamp::from_millis(1_704_067_200_000);

pub const HOUR: Duration = Duration::from_secs(3600);

/// Wall clock that advances with tokio's (possibly paused) clock.
pub struct TokioClock {
    origin: tokio::time::Instant,
    base: Timestamp,
}

impl TokioClock {
    pub fn starting_at(base: Timestamp) -> Arc<Self> {
        Arc::new(Self {
            origin: tokio::time::Instant::now(),
            base,
        })
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Timestamp {
        self.base.saturating_add(self.origin.elapsed())
    }
}

pub fn test_config() -> EngineConfig {
    EngineConfig {
        retention: 24 * HOUR,
        sweep_interval: HOUR,
        close_retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(40),
        },
        ..EngineConfig::default()
    }
}

pub fn new_giveaway(prize: &str, winner_count: u32, end_at: Timestamp) -> NewGiveaway {
    NewGiveaway {
        host_ref: "host-1".to_string(),
        channel_ref: "channel-1".to_string(),
        message_ref: None,
        prize: prize.to_string(),
        winner_count,
        required_role_ref: None,
        end_at,
    }
}

/// A record as a previous process would have persisted it.
pub fn stored_record(
    status: GiveawayStatus,
    participants: &[&str],
    winner_count: u32,
    end_at: Timestamp,
) -> GiveawayRecord {
    GiveawayRecord {
        id: GiveawayId::new(),
        host_ref: "host-1".to_string(),
        channel_ref: "channel-1".to_string(),
        message_ref: Some("message-1".to_string()),
        prize: "Nitro".to_string(),
        winner_count,
        required_role_ref: None,
        participants: participant_set(participants),
        status,
        created_at: end_at.saturating_sub(HOUR),
        end_at,
        closed_at: None,
        winners: Vec::new(),
        purge_at: None,
    }
}

pub fn participant_set(ids: &[&str]) -> ParticipantSet {
    ids.iter().map(|id| ParticipantId::from(*id)).collect()
}

/// Counts every announcement; optionally fails all of them.
#[derive(Default)]
pub struct RecordingNotifier {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub no_participants: AtomicUsize,
    pub last_winners: Mutex<Vec<ParticipantId>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        Arc::new(notifier)
    }

    /// Closure announcements of either kind.
    pub fn closures(&self) -> usize {
        self.closed.load(Ordering::SeqCst) + self.no_participants.load(Ordering::SeqCst)
    }

    fn outcome(&self) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(NotifyError(eyre::eyre!("gateway timeout")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn announce_open(&self, _record: &GiveawayRecord) -> Result<Option<String>, NotifyError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.outcome().map(|_| Some("message-42".to_string()))
    }

    async fn announce_closed(
        &self,
        _record: &GiveawayRecord,
        winners: &[ParticipantId],
    ) -> Result<(), NotifyError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        *self.last_winners.lock().unwrap() = winners.to_vec();
        self.outcome()
    }

    async fn announce_no_participants(&self, _record: &GiveawayRecord) -> Result<(), NotifyError> {
        self.no_participants.fetch_add(1, Ordering::SeqCst);
        self.outcome()
    }
}

/// Wraps a [`MemoryStore`] and injects failures into closure persistence.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    /// Upcoming `mark_closed` calls that fail as unavailable.
    pub failing_closes: AtomicU32,
    pub close_attempts: AtomicU32,
    /// Upcoming `mark_closed` calls that commit but then report unavailable.
    pub lost_acks: AtomicU32,
    /// Participant slipped in right before the next `mark_closed`.
    pub late_joiner: Mutex<Option<ParticipantId>>,
}

impl FlakyStore {
    pub fn failing(closes: u32) -> Arc<Self> {
        let store = Self::default();
        store.failing_closes.store(closes, Ordering::SeqCst);
        Arc::new(store)
    }
}

#[async_trait]
impl GiveawayStore for FlakyStore {
    async fn create_record(
        &self,
        new: &NewGiveaway,
        created_at: Timestamp,
    ) -> StoreResult<GiveawayRecord> {
        self.inner.create_record(new, created_at).await
    }

    async fn get_by_id(&self, id: GiveawayId) -> StoreResult<Option<GiveawayRecord>> {
        self.inner.get_by_id(id).await
    }

    async fn update_participants(
        &self,
        id: GiveawayId,
        expected: GiveawayStatus,
        mutate: ParticipantMutator<'_>,
    ) -> StoreResult<UpdateOutcome> {
        self.inner.update_participants(id, expected, mutate).await
    }

    async fn mark_closed(
        &self,
        id: GiveawayId,
        snapshot: &ParticipantSet,
        winners: &[ParticipantId],
        closed_at: Timestamp,
    ) -> StoreResult<CloseOutcome> {
        self.close_attempts.fetch_add(1, Ordering::SeqCst);

        let remaining = self.failing_closes.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_closes.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable(eyre::eyre!("connection reset by peer")));
        }

        let late_joiner = self.late_joiner.lock().unwrap().take();
        if let Some(participant) = late_joiner {
            let join = |participants: &mut ParticipantSet| {
                participants.insert(participant.clone());
                Ok::<usize, EntryError>(participants.len())
            };
            self.inner
                .update_participants(id, GiveawayStatus::Open, &join)
                .await?;
        }

        let outcome = self.inner.mark_closed(id, snapshot, winners, closed_at).await?;

        let lost = self.lost_acks.load(Ordering::SeqCst);
        if lost > 0 {
            self.lost_acks.store(lost - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable(eyre::eyre!("connection closed before reply")));
        }
        Ok(outcome)
    }

    async fn set_purge_at(&self, id: GiveawayId, purge_at: Timestamp) -> StoreResult<()> {
        self.inner.set_purge_at(id, purge_at).await
    }

    async fn set_message_ref(&self, id: GiveawayId, message_ref: &str) -> StoreResult<()> {
        self.inner.set_message_ref(id, message_ref).await
    }

    async fn list_open(&self) -> StoreResult<Vec<GiveawayRecord>> {
        self.inner.list_open().await
    }

    async fn list_closed_past(&self, deadline: Timestamp) -> StoreResult<Vec<GiveawayRecord>> {
        self.inner.list_closed_past(deadline).await
    }

    async fn list_closed_unscheduled(&self) -> StoreResult<Vec<GiveawayRecord>> {
        self.inner.list_closed_unscheduled().await
    }

    async fn delete(&self, id: GiveawayId) -> StoreResult<bool> {
        self.inner.delete(id).await
    }
}
