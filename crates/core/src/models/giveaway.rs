use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::timestamp::Timestamp;
use crate::errors::{GiveawayError, GiveawayResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GiveawayId(pub Uuid);

impl GiveawayId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GiveawayId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GiveawayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for GiveawayId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Opaque identifier of someone who entered a giveaway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type ParticipantSet = BTreeSet<ParticipantId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GiveawayStatus {
    Open,
    Closed,
}

impl GiveawayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GiveawayStatus::Open => "open",
            GiveawayStatus::Closed => "closed",
        }
    }
}

impl FromStr for GiveawayStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(GiveawayStatus::Open),
            "closed" => Ok(GiveawayStatus::Closed),
            other => Err(format!("unknown giveaway status: {other}")),
        }
    }
}

/// One time-boxed drawing as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiveawayRecord {
    pub id: GiveawayId,
    pub host_ref: String,
    pub channel_ref: String,
    pub message_ref: Option<String>,
    pub prize: String,
    pub winner_count: u32,
    pub required_role_ref: Option<String>,
    pub participants: ParticipantSet,
    pub status: GiveawayStatus,
    pub created_at: Timestamp,
    pub end_at: Timestamp,
    pub closed_at: Option<Timestamp>,
    pub winners: Vec<ParticipantId>,
    pub purge_at: Option<Timestamp>,
}

impl GiveawayRecord {
    pub fn is_open(&self) -> bool {
        self.status == GiveawayStatus::Open
    }

    /// Number of winners a draw over the current participants produces.
    pub fn expected_winner_count(&self) -> usize {
        (self.winner_count as usize).min(self.participants.len())
    }
}

/// Parameters a host supplies to start a giveaway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGiveaway {
    pub host_ref: String,
    pub channel_ref: String,
    pub message_ref: Option<String>,
    pub prize: String,
    pub winner_count: u32,
    pub required_role_ref: Option<String>,
    pub end_at: Timestamp,
}

impl NewGiveaway {
    pub fn validate(&self, now: Timestamp) -> GiveawayResult<()> {
        if self.prize.trim().is_empty() {
            return Err(GiveawayError::Validation("prize must not be empty".into()));
        }
        if self.winner_count < 1 {
            return Err(GiveawayError::Validation(
                "winner count must be at least 1".into(),
            ));
        }
        if self.end_at <= now {
            return Err(GiveawayError::Validation(format!(
                "end time {} is not in the future",
                self.end_at
            )));
        }
        Ok(())
    }

    /// Build the initial open record once the store has assigned an id.
    pub fn into_record(self, id: GiveawayId, created_at: Timestamp) -> GiveawayRecord {
        GiveawayRecord {
            id,
            host_ref: self.host_ref,
            channel_ref: self.channel_ref,
            message_ref: self.message_ref,
            prize: self.prize,
            winner_count: self.winner_count,
            required_role_ref: self.required_role_ref,
            participants: ParticipantSet::new(),
            status: GiveawayStatus::Open,
            created_at,
            end_at: self.end_at,
            closed_at: None,
            winners: Vec::new(),
            purge_at: None,
        }
    }
}
