use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::errors::{EntryError, GiveawayError, GiveawayResult};
use crate::ledger::EntryLedger;
use crate::lifecycle::{CloseReason, CloseResult, LifecycleManager};
use crate::models::{GiveawayId, GiveawayRecord, NewGiveaway, ParticipantId};
use crate::notifier::{EligibilityChecker, Notifier};
use crate::restoration::{RestorationReport, RestorationService};
use crate::retention::RetentionSweeper;
use crate::selector::{NoBonus, WeightingPolicy, WinnerSelector};
use crate::store::GiveawayStore;

/// Entry point used by front-ends.
///
/// [`start`](GiveawayEngine::start) restores in-flight giveaways from the store
/// and starts the retention sweeper before handing back an engine that accepts
/// traffic, so no create or entry request can observe half-restored state.
pub struct GiveawayEngine {
    store: Arc<dyn GiveawayStore>,
    manager: Arc<LifecycleManager>,
    ledger: EntryLedger,
    restored: RestorationReport,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl GiveawayEngine {
    pub async fn start(
        store: Arc<dyn GiveawayStore>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> GiveawayResult<Self> {
        Self::start_with_clock(store, notifier, config, Arc::new(SystemClock)).await
    }

    pub async fn start_with_clock(
        store: Arc<dyn GiveawayStore>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> GiveawayResult<Self> {
        let policy: Arc<dyn WeightingPolicy> = if config.bonus_entries.is_empty() {
            Arc::new(NoBonus)
        } else {
            Arc::new(config.bonus_entries.clone())
        };

        let manager = LifecycleManager::new(
            Arc::clone(&store),
            notifier,
            WinnerSelector::new(policy),
            Arc::clone(&clock),
            config.close_retry,
            config.retention,
        );

        let restored = RestorationService::new(Arc::clone(&store), Arc::clone(&manager), Arc::clone(&clock))
            .restore()
            .await?;

        let sweeper = Arc::new(RetentionSweeper::new(
            Arc::clone(&store),
            clock,
            config.sweep_interval,
            config.retention,
        ))
        .spawn();

        info!("Giveaway engine started");
        Ok(Self {
            ledger: EntryLedger::new(Arc::clone(&store)),
            store,
            manager,
            restored,
            sweeper: Mutex::new(Some(sweeper)),
        })
    }

    /// What startup restoration did.
    pub fn restoration_report(&self) -> RestorationReport {
        self.restored
    }

    pub fn manager(&self) -> &Arc<LifecycleManager> {
        &self.manager
    }

    pub async fn create(&self, new: NewGiveaway) -> GiveawayResult<GiveawayRecord> {
        self.manager.create(new).await
    }

    pub async fn get(&self, id: GiveawayId) -> GiveawayResult<GiveawayRecord> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(GiveawayError::NotFound(id))
    }

    /// Join with an eligibility verdict the caller already computed.
    pub async fn join(
        &self,
        id: GiveawayId,
        participant: &ParticipantId,
        eligible: bool,
    ) -> Result<usize, EntryError> {
        self.ledger.join(id, participant, eligible).await
    }

    /// Join, evaluating the giveaway's role requirement with `checker` first.
    pub async fn join_checked(
        &self,
        id: GiveawayId,
        participant: &ParticipantId,
        checker: &dyn EligibilityChecker,
    ) -> Result<usize, EntryError> {
        let record = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(EntryError::NotFound(id))?;
        // The role requirement is fixed at creation, so this read cannot go stale
        // before the conditional join below.
        let eligible = checker.is_eligible(participant, record.required_role_ref.as_deref());
        self.ledger.join(id, participant, eligible).await
    }

    pub async fn leave(&self, id: GiveawayId, participant: &ParticipantId) -> Result<usize, EntryError> {
        self.ledger.leave(id, participant).await
    }

    /// Close `id` now instead of waiting for its deadline.
    pub async fn end_now(&self, id: GiveawayId) -> GiveawayResult<CloseResult> {
        self.manager.request_close(id, CloseReason::Manual).await
    }

    pub async fn active_timer_count(&self) -> usize {
        self.manager.armed_count().await
    }

    /// Stop the sweeper and drop every in-memory timer. Persisted state is
    /// untouched; the next start restores from it.
    pub async fn shutdown(&self) {
        if let Some(sweeper) = self.sweeper.lock().await.take() {
            sweeper.abort();
        }
        self.manager.shutdown().await;
        info!("Giveaway engine stopped");
    }
}
