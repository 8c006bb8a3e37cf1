use thiserror::Error;

use crate::models::giveaway::GiveawayId;

/// Failures reported by a [`GiveawayStore`](crate::store::GiveawayStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(#[from] eyre::Report),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Typed outcomes of join/leave requests.
///
/// Everything except `Store` is an expected answer for the caller to relay to
/// the participant, not a fault.
#[derive(Error, Debug)]
pub enum EntryError {
    #[error("Giveaway not found: {0}")]
    NotFound(GiveawayId),

    #[error("This giveaway has already ended")]
    AlreadyEnded,

    #[error("You are not eligible to enter this giveaway")]
    NotEligible,

    #[error("You have already entered this giveaway")]
    AlreadyParticipant,

    #[error("You are not entered in this giveaway")]
    NotAParticipant,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum GiveawayError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Giveaway not found: {0}")]
    NotFound(GiveawayId),

    #[error("Giveaway {0} kept changing while closing")]
    Contended(GiveawayId),

    #[error("Store unavailable after {attempts} attempts: {source}")]
    StoreUnavailable {
        attempts: u32,
        #[source]
        source: StoreError,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type GiveawayResult<T> = Result<T, GiveawayError>;

/// A notification could not be delivered. Logged by the engine, never retried.
#[derive(Error, Debug)]
#[error("Notification failed: {0}")]
pub struct NotifyError(#[from] pub eyre::Report);
