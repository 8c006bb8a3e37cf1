use std::sync::Arc;

use tracing::debug;

use crate::errors::EntryError;
use crate::models::{GiveawayId, GiveawayStatus, ParticipantId, ParticipantSet};
use crate::store::{GiveawayStore, UpdateOutcome};

/// Join/leave requests against open giveaways.
///
/// Each request is a single conditional read-modify-write in the store, so two
/// concurrent joins never clobber each other and a join racing closure lands
/// strictly before it or is rejected with [`EntryError::AlreadyEnded`].
#[derive(Clone)]
pub struct EntryLedger {
    store: Arc<dyn GiveawayStore>,
}

impl EntryLedger {
    pub fn new(store: Arc<dyn GiveawayStore>) -> Self {
        Self { store }
    }

    /// Add `participant`; `eligible` is the caller's verdict on the role
    /// requirement. Returns the new participant count.
    pub async fn join(
        &self,
        id: GiveawayId,
        participant: &ParticipantId,
        eligible: bool,
    ) -> Result<usize, EntryError> {
        let mutate = |participants: &mut ParticipantSet| {
            if !eligible {
                return Err(EntryError::NotEligible);
            }
            if !participants.insert(participant.clone()) {
                return Err(EntryError::AlreadyParticipant);
            }
            Ok(participants.len())
        };

        let outcome = self
            .store
            .update_participants(id, GiveawayStatus::Open, &mutate)
            .await?;
        let count = resolve(id, outcome)?;

        debug!(giveaway_id = %id, participant = %participant, count, "Participant joined");
        Ok(count)
    }

    /// Remove `participant`. Returns the new participant count.
    pub async fn leave(
        &self,
        id: GiveawayId,
        participant: &ParticipantId,
    ) -> Result<usize, EntryError> {
        let mutate = |participants: &mut ParticipantSet| {
            if !participants.remove(participant) {
                return Err(EntryError::NotAParticipant);
            }
            Ok(participants.len())
        };

        let outcome = self
            .store
            .update_participants(id, GiveawayStatus::Open, &mutate)
            .await?;
        let count = resolve(id, outcome)?;

        debug!(giveaway_id = %id, participant = %participant, count, "Participant left");
        Ok(count)
    }
}

fn resolve(id: GiveawayId, outcome: UpdateOutcome) -> Result<usize, EntryError> {
    match outcome {
        UpdateOutcome::Applied(count) => Ok(count),
        UpdateOutcome::Rejected(rejection) => Err(rejection),
        UpdateOutcome::StatusMismatch(_) => Err(EntryError::AlreadyEnded),
        UpdateOutcome::NotFound => Err(EntryError::NotFound(id)),
    }
}
