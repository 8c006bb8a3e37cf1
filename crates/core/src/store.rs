use async_trait::async_trait;

use crate::errors::{EntryError, StoreResult};
use crate::models::{
    GiveawayId, GiveawayRecord, GiveawayStatus, NewGiveaway, ParticipantId, ParticipantSet,
    Timestamp,
};

pub mod memory;

pub use memory::MemoryStore;

/// Read-modify-write step applied to a participant set under the store's lock.
/// Returns the new participant count, or the rejection to hand back.
pub type ParticipantMutator<'a> =
    &'a (dyn Fn(&mut ParticipantSet) -> Result<usize, EntryError> + Send + Sync);

#[derive(Debug)]
pub enum UpdateOutcome {
    /// The mutation was applied and persisted; carries the new count.
    Applied(usize),
    /// The mutator refused; nothing was written.
    Rejected(EntryError),
    /// The record was not in the expected status; carries the actual one.
    StatusMismatch(GiveawayStatus),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    AlreadyClosed,
    /// The participant set no longer matches the snapshot the draw used.
    Stale,
    NotFound,
}

/// Persistence contract consumed by the engine. The store is the single source
/// of truth; every method is a suspension point.
#[async_trait]
pub trait GiveawayStore: Send + Sync {
    /// Persist a new open giveaway and return it with its assigned id.
    async fn create_record(
        &self,
        new: &NewGiveaway,
        created_at: Timestamp,
    ) -> StoreResult<GiveawayRecord>;

    async fn get_by_id(&self, id: GiveawayId) -> StoreResult<Option<GiveawayRecord>>;

    /// Atomically apply `mutate` to the participants of `id` if the record is
    /// currently in `expected` status.
    async fn update_participants(
        &self,
        id: GiveawayId,
        expected: GiveawayStatus,
        mutate: ParticipantMutator<'_>,
    ) -> StoreResult<UpdateOutcome>;

    /// Transition `id` to closed, only while it is open and its participants
    /// still equal `snapshot`.
    async fn mark_closed(
        &self,
        id: GiveawayId,
        snapshot: &ParticipantSet,
        winners: &[ParticipantId],
        closed_at: Timestamp,
    ) -> StoreResult<CloseOutcome>;

    async fn set_purge_at(&self, id: GiveawayId, purge_at: Timestamp) -> StoreResult<()>;

    async fn set_message_ref(&self, id: GiveawayId, message_ref: &str) -> StoreResult<()>;

    async fn list_open(&self) -> StoreResult<Vec<GiveawayRecord>>;

    /// Closed records whose purge deadline is at or before `deadline`.
    async fn list_closed_past(&self, deadline: Timestamp) -> StoreResult<Vec<GiveawayRecord>>;

    /// Closed records that never had a purge deadline recorded.
    async fn list_closed_unscheduled(&self) -> StoreResult<Vec<GiveawayRecord>>;

    /// Delete `id`. Returns whether a record was actually removed; deleting a
    /// missing record is not an error.
    async fn delete(&self, id: GiveawayId) -> StoreResult<bool>;
}
