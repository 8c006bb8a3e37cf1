pub mod giveaway;
pub mod timestamp;

pub use giveaway::{
    GiveawayId, GiveawayRecord, GiveawayStatus, NewGiveaway, ParticipantId, ParticipantSet,
};
pub use timestamp::{RawTimestamp, Timestamp};
