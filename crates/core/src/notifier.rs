use async_trait::async_trait;

use crate::errors::NotifyError;
use crate::models::{GiveawayRecord, ParticipantId};

/// Outbound announcements. Fire-and-forget from the engine's point of view:
/// failures are logged and never block a state transition.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce a freshly created giveaway. May return a reference to the
    /// message it posted, which the engine records on the giveaway.
    async fn announce_open(&self, record: &GiveawayRecord) -> Result<Option<String>, NotifyError>;

    async fn announce_closed(
        &self,
        record: &GiveawayRecord,
        winners: &[ParticipantId],
    ) -> Result<(), NotifyError>;

    async fn announce_no_participants(&self, record: &GiveawayRecord) -> Result<(), NotifyError>;
}

/// Decides whether a participant satisfies a giveaway's role requirement.
/// Evaluated by the caller before an entry reaches the ledger.
pub trait EligibilityChecker: Send + Sync {
    fn is_eligible(&self, participant: &ParticipantId, required_role_ref: Option<&str>) -> bool;
}

impl<F> EligibilityChecker for F
where
    F: Fn(&ParticipantId, Option<&str>) -> bool + Send + Sync,
{
    fn is_eligible(&self, participant: &ParticipantId, required_role_ref: Option<&str>) -> bool {
        self(participant, required_role_ref)
    }
}
