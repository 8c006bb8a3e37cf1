use async_trait::async_trait;
use giveaways_core::errors::{StoreError, StoreResult};
use giveaways_core::models::{
    GiveawayId, GiveawayRecord, GiveawayStatus, NewGiveaway, ParticipantId, ParticipantSet,
    Timestamp,
};
use giveaways_core::store::{CloseOutcome, GiveawayStore, ParticipantMutator, UpdateOutcome};
use tracing::{debug, warn};

use crate::DbPool;
use crate::models::DbGiveaway;
use crate::repositories::giveaway;

/// [`GiveawayStore`] backed by the `giveaways` table.
#[derive(Clone)]
pub struct PgGiveawayStore {
    pool: DbPool,
}

impl PgGiveawayStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn unavailable(error: sqlx::Error) -> StoreError {
    StoreError::Unavailable(error.into())
}

fn to_strings<'a>(participants: impl IntoIterator<Item = &'a ParticipantId>) -> Vec<String> {
    participants.into_iter().map(|p| p.0.clone()).collect()
}

/// Decode rows for a listing. A row that cannot be decoded is reported and
/// skipped so it cannot hold back every other giveaway.
fn decode_all(rows: Vec<DbGiveaway>) -> Vec<GiveawayRecord> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match row.into_record() {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(giveaway_id = %id, "Skipping unreadable giveaway: {}", e);
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl GiveawayStore for PgGiveawayStore {
    async fn create_record(
        &self,
        new: &NewGiveaway,
        created_at: Timestamp,
    ) -> StoreResult<GiveawayRecord> {
        let winner_count = i32::try_from(new.winner_count)
            .map_err(|_| StoreError::Corrupt(format!("winner_count too large: {}", new.winner_count)))?;

        let row = giveaway::create_giveaway(
            &self.pool,
            GiveawayId::new().0,
            &new.host_ref,
            &new.channel_ref,
            new.message_ref.as_deref(),
            &new.prize,
            winner_count,
            new.required_role_ref.as_deref(),
            created_at.as_millis(),
            new.end_at.as_millis(),
        )
        .await?;

        row.into_record()
    }

    async fn get_by_id(&self, id: GiveawayId) -> StoreResult<Option<GiveawayRecord>> {
        giveaway::get_giveaway_by_id(&self.pool, id.0)
            .await?
            .map(DbGiveaway::into_record)
            .transpose()
    }

    async fn update_participants(
        &self,
        id: GiveawayId,
        expected: GiveawayStatus,
        mutate: ParticipantMutator<'_>,
    ) -> StoreResult<UpdateOutcome> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let Some(row) = giveaway::lock_giveaway(&mut tx, id.0).await? else {
            return Ok(UpdateOutcome::NotFound);
        };
        let record = row.into_record()?;
        if record.status != expected {
            return Ok(UpdateOutcome::StatusMismatch(record.status));
        }

        let mut participants = record.participants;
        let count = match mutate(&mut participants) {
            Ok(count) => count,
            // Dropping the transaction rolls it back and releases the lock.
            Err(rejection) => return Ok(UpdateOutcome::Rejected(rejection)),
        };

        giveaway::set_participants(&mut tx, id.0, &to_strings(&participants)).await?;
        tx.commit().await.map_err(unavailable)?;

        debug!(giveaway_id = %id, participants = count, "Participants updated");
        Ok(UpdateOutcome::Applied(count))
    }

    async fn mark_closed(
        &self,
        id: GiveawayId,
        snapshot: &ParticipantSet,
        winners: &[ParticipantId],
        closed_at: Timestamp,
    ) -> StoreResult<CloseOutcome> {
        // BTreeSet iteration order matches the bytewise ordering the query
        // sorts the stored participants into.
        let closed = giveaway::close_giveaway(
            &self.pool,
            id.0,
            &to_strings(snapshot),
            &to_strings(winners),
            closed_at.as_millis(),
        )
        .await?;
        if closed {
            return Ok(CloseOutcome::Closed);
        }

        let status = giveaway::get_giveaway_status(&self.pool, id.0).await?;
        Ok(match status.as_deref() {
            None => CloseOutcome::NotFound,
            Some("closed") => CloseOutcome::AlreadyClosed,
            Some(_) => CloseOutcome::Stale,
        })
    }

    async fn set_purge_at(&self, id: GiveawayId, purge_at: Timestamp) -> StoreResult<()> {
        giveaway::set_purge_at(&self.pool, id.0, purge_at.as_millis()).await?;
        Ok(())
    }

    async fn set_message_ref(&self, id: GiveawayId, message_ref: &str) -> StoreResult<()> {
        giveaway::set_message_ref(&self.pool, id.0, message_ref).await?;
        Ok(())
    }

    async fn list_open(&self) -> StoreResult<Vec<GiveawayRecord>> {
        Ok(decode_all(giveaway::get_open_giveaways(&self.pool).await?))
    }

    async fn list_closed_past(&self, deadline: Timestamp) -> StoreResult<Vec<GiveawayRecord>> {
        Ok(decode_all(
            giveaway::get_closed_giveaways_past(&self.pool, deadline.as_millis()).await?,
        ))
    }

    async fn list_closed_unscheduled(&self) -> StoreResult<Vec<GiveawayRecord>> {
        Ok(decode_all(
            giveaway::get_closed_giveaways_without_purge(&self.pool).await?,
        ))
    }

    async fn delete(&self, id: GiveawayId) -> StoreResult<bool> {
        Ok(giveaway::delete_giveaway(&self.pool, id.0).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_snapshot_is_written_in_bytewise_order() {
        let snapshot: ParticipantSet = ["b", "B", "a", "10", "9"]
            .into_iter()
            .map(ParticipantId::from)
            .collect();

        assert_eq!(to_strings(&snapshot), vec!["10", "9", "B", "a", "b"]);
    }

    #[test]
    fn test_corrupt_rows_are_skipped_in_listings() {
        let good = DbGiveaway {
            id: uuid::Uuid::new_v4(),
            host_ref: "1001".to_string(),
            channel_ref: "2002".to_string(),
            message_ref: None,
            prize: "Nitro".to_string(),
            winner_count: 1,
            required_role_ref: None,
            participants: Vec::new(),
            status: "open".to_string(),
            created_at: 1_700_000_000_000,
            end_at: "1700000600000".to_string(),
            closed_at: None,
            winners: Vec::new(),
            purge_at: None,
        };
        let bad = DbGiveaway {
            id: uuid::Uuid::new_v4(),
            end_at: "whenever".to_string(),
            ..good.clone()
        };

        let records = decode_all(vec![bad, good.clone()]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, GiveawayId(good.id));
    }
}
