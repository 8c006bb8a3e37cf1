//! Weighted, duplicate-free winner draw.
//!
//! Every participant contributes one base entry plus whatever bonus entries the
//! injected [`WeightingPolicy`] grants. The pool is shuffled with a uniform
//! Fisher-Yates permutation and walked in order, accepting each participant the
//! first time they appear, until enough distinct winners are found.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::models::{ParticipantId, ParticipantSet};

/// Upper bound on bonus entries granted to one participant.
pub const MAX_BONUS_ENTRIES: u32 = 100;

/// Extra entries granted to a participant on top of their base entry.
pub trait WeightingPolicy: Send + Sync {
    fn bonus_entries(&self, participant: &ParticipantId) -> u32;
}

/// Everyone gets exactly one entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBonus;

impl WeightingPolicy for NoBonus {
    fn bonus_entries(&self, _participant: &ParticipantId) -> u32 {
        0
    }
}

/// Explicitly configured bonus entries per participant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BonusTable(HashMap<ParticipantId, u32>);

impl BonusTable {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse `participant:extra,participant:extra`.
    pub fn parse(input: &str) -> Result<Self, String> {
        let mut table = HashMap::new();
        for pair in input.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
            let (participant, extra) = pair
                .split_once(':')
                .ok_or_else(|| format!("expected participant:entries, got {pair:?}"))?;
            let extra = extra
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid bonus entry count in {pair:?}"))?;
            table.insert(ParticipantId::from(participant.trim()), extra);
        }
        Ok(Self(table))
    }
}

impl FromIterator<(ParticipantId, u32)> for BonusTable {
    fn from_iter<I: IntoIterator<Item = (ParticipantId, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl WeightingPolicy for BonusTable {
    fn bonus_entries(&self, participant: &ParticipantId) -> u32 {
        self.0.get(participant).copied().unwrap_or(0)
    }
}

#[derive(Clone)]
pub struct WinnerSelector {
    policy: Arc<dyn WeightingPolicy>,
}

impl Default for WinnerSelector {
    fn default() -> Self {
        Self::new(Arc::new(NoBonus))
    }
}

impl WinnerSelector {
    pub fn new(policy: Arc<dyn WeightingPolicy>) -> Self {
        Self { policy }
    }

    /// Draw with the thread-local RNG.
    pub fn draw(&self, participants: &ParticipantSet, winner_count: u32) -> Vec<ParticipantId> {
        self.draw_with(&mut rand::thread_rng(), participants, winner_count)
    }

    /// Draw `min(winner_count, |participants|)` distinct winners.
    pub fn draw_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        participants: &ParticipantSet,
        winner_count: u32,
    ) -> Vec<ParticipantId> {
        let wanted = (winner_count as usize).min(participants.len());
        if wanted == 0 {
            return Vec::new();
        }

        let mut pool = self.entry_pool(participants);
        pool.shuffle(rng);

        let mut seen = HashSet::with_capacity(wanted);
        let mut winners = Vec::with_capacity(wanted);
        for participant in pool {
            if winners.len() == wanted {
                break;
            }
            if seen.insert(participant) {
                winners.push(participant.clone());
            }
        }
        winners
    }

    /// One base entry per participant plus their bonus entries.
    pub fn entry_pool<'a>(&self, participants: &'a ParticipantSet) -> Vec<&'a ParticipantId> {
        let mut pool = Vec::with_capacity(participants.len());
        for participant in participants {
            let bonus = self.policy.bonus_entries(participant).min(MAX_BONUS_ENTRIES);
            for _ in 0..=bonus {
                pool.push(participant);
            }
        }
        pool
    }
}
