use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CloseOutcome, GiveawayStore, ParticipantMutator, UpdateOutcome};
use crate::errors::StoreResult;
use crate::models::{
    GiveawayId, GiveawayRecord, GiveawayStatus, NewGiveaway, ParticipantId, ParticipantSet,
    Timestamp,
};

/// In-process store. Holds records behind one lock, so every operation is
/// trivially atomic. Used for tests and for running the engine without a
/// database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<GiveawayId, GiveawayRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record verbatim, bypassing validation. Lets callers seed state
    /// as a previous process would have left it.
    pub async fn insert(&self, record: GiveawayRecord) {
        self.records.write().await.insert(record.id, record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl GiveawayStore for MemoryStore {
    async fn create_record(
        &self,
        new: &NewGiveaway,
        created_at: Timestamp,
    ) -> StoreResult<GiveawayRecord> {
        let record = new.clone().into_record(GiveawayId::new(), created_at);
        self.records.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: GiveawayId) -> StoreResult<Option<GiveawayRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn update_participants(
        &self,
        id: GiveawayId,
        expected: GiveawayStatus,
        mutate: ParticipantMutator<'_>,
    ) -> StoreResult<UpdateOutcome> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(&id) else {
            return Ok(UpdateOutcome::NotFound);
        };
        if record.status != expected {
            return Ok(UpdateOutcome::StatusMismatch(record.status));
        }

        let mut participants = record.participants.clone();
        match mutate(&mut participants) {
            Ok(count) => {
                record.participants = participants;
                Ok(UpdateOutcome::Applied(count))
            }
            Err(rejection) => Ok(UpdateOutcome::Rejected(rejection)),
        }
    }

    async fn mark_closed(
        &self,
        id: GiveawayId,
        snapshot: &ParticipantSet,
        winners: &[ParticipantId],
        closed_at: Timestamp,
    ) -> StoreResult<CloseOutcome> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(&id) else {
            return Ok(CloseOutcome::NotFound);
        };
        if record.status == GiveawayStatus::Closed {
            return Ok(CloseOutcome::AlreadyClosed);
        }
        if &record.participants != snapshot {
            return Ok(CloseOutcome::Stale);
        }

        record.status = GiveawayStatus::Closed;
        record.closed_at = Some(closed_at);
        record.winners = winners.to_vec();
        Ok(CloseOutcome::Closed)
    }

    async fn set_purge_at(&self, id: GiveawayId, purge_at: Timestamp) -> StoreResult<()> {
        if let Some(record) = self.records.write().await.get_mut(&id) {
            record.purge_at = Some(purge_at);
        }
        Ok(())
    }

    async fn set_message_ref(&self, id: GiveawayId, message_ref: &str) -> StoreResult<()> {
        if let Some(record) = self.records.write().await.get_mut(&id) {
            record.message_ref = Some(message_ref.to_string());
        }
        Ok(())
    }

    async fn list_open(&self) -> StoreResult<Vec<GiveawayRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.is_open())
            .cloned()
            .collect())
    }

    async fn list_closed_past(&self, deadline: Timestamp) -> StoreResult<Vec<GiveawayRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|record| {
                record.status == GiveawayStatus::Closed
                    && record.purge_at.is_some_and(|purge_at| purge_at <= deadline)
            })
            .cloned()
            .collect())
    }

    async fn list_closed_unscheduled(&self) -> StoreResult<Vec<GiveawayRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.status == GiveawayStatus::Closed && record.purge_at.is_none())
            .cloned()
            .collect())
    }

    async fn delete(&self, id: GiveawayId) -> StoreResult<bool> {
        Ok(self.records.write().await.remove(&id).is_some())
    }
}
