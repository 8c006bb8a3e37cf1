use giveaways_core::errors::StoreError;
use giveaways_core::models::{
    GiveawayId, GiveawayRecord, GiveawayStatus, ParticipantId, RawTimestamp, Timestamp,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbGiveaway {
    pub id: Uuid,
    pub host_ref: String,
    pub channel_ref: String,
    pub message_ref: Option<String>,
    pub prize: String,
    pub winner_count: i32,
    pub required_role_ref: Option<String>,
    pub participants: Vec<String>,
    pub status: String,
    pub created_at: i64,
    pub end_at: String,
    pub closed_at: Option<i64>,
    pub winners: Vec<String>,
    pub purge_at: Option<i64>,
}

impl DbGiveaway {
    /// Decode a row, normalizing whichever encoding `end_at` was written in.
    pub fn into_record(self) -> Result<GiveawayRecord, StoreError> {
        let status = self
            .status
            .parse::<GiveawayStatus>()
            .map_err(StoreError::Corrupt)?;
        let winner_count = u32::try_from(self.winner_count).map_err(|_| {
            StoreError::Corrupt(format!("negative winner_count: {}", self.winner_count))
        })?;
        let end_at = RawTimestamp::Text(self.end_at).normalize()?;

        Ok(GiveawayRecord {
            id: GiveawayId(self.id),
            host_ref: self.host_ref,
            channel_ref: self.channel_ref,
            message_ref: self.message_ref,
            prize: self.prize,
            winner_count,
            required_role_ref: self.required_role_ref,
            participants: self.participants.into_iter().map(ParticipantId::from).collect(),
            status,
            created_at: Timestamp::from_millis(self.created_at),
            end_at,
            closed_at: self.closed_at.map(Timestamp::from_millis),
            winners: self.winners.into_iter().map(ParticipantId::from).collect(),
            purge_at: self.purge_at.map(Timestamp::from_millis),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn row(end_at: &str) -> DbGiveaway {
        DbGiveaway {
            id: Uuid::new_v4(),
            host_ref: "1001".to_string(),
            channel_ref: "2002".to_string(),
            message_ref: Some("3003".to_string()),
            prize: "Nitro".to_string(),
            winner_count: 2,
            required_role_ref: None,
            participants: vec!["b".to_string(), "a".to_string()],
            status: "open".to_string(),
            created_at: 1_699_999_000_000,
            end_at: end_at.to_string(),
            closed_at: None,
            winners: Vec::new(),
            purge_at: None,
        }
    }

    #[rstest]
    #[case("1700000000000")]
    #[case("1700000000")]
    #[case("2023-11-14T22:13:20Z")]
    #[case("2023-11-14 22:13:20")]
    fn test_end_at_encodings_decode_to_the_same_instant(#[case] end_at: &str) {
        let record = row(end_at).into_record().unwrap();

        assert_eq!(record.end_at, Timestamp::from_millis(1_700_000_000_000));
    }

    #[test]
    fn test_row_maps_every_field() {
        let mut db = row("1700000000000");
        db.status = "closed".to_string();
        db.closed_at = Some(1_700_000_000_500);
        db.winners = vec!["b".to_string()];
        db.purge_at = Some(1_700_086_400_500);
        let id = db.id;

        let record = db.into_record().unwrap();

        assert_eq!(record.id, GiveawayId(id));
        assert_eq!(record.status, GiveawayStatus::Closed);
        assert_eq!(record.winner_count, 2);
        assert_eq!(
            record.participants.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(record.winners, vec![ParticipantId::from("b")]);
        assert_eq!(record.closed_at, Some(Timestamp::from_millis(1_700_000_000_500)));
        assert_eq!(record.purge_at, Some(Timestamp::from_millis(1_700_086_400_500)));
        assert_eq!(record.message_ref.as_deref(), Some("3003"));
    }

    #[test]
    fn test_unreadable_rows_are_corrupt() {
        assert!(matches!(
            row("next tuesday").into_record(),
            Err(StoreError::Corrupt(_))
        ));

        let mut bad_status = row("1700000000000");
        bad_status.status = "paused".to_string();
        assert!(matches!(bad_status.into_record(), Err(StoreError::Corrupt(_))));

        let mut bad_count = row("1700000000000");
        bad_count.winner_count = -1;
        assert!(matches!(bad_count.into_record(), Err(StoreError::Corrupt(_))));
    }
}
