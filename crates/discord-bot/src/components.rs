//! Custom ids carried by the buttons on a giveaway message.

use giveaways_core::models::GiveawayId;

const PREFIX: &str = "giveaway";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    Join,
    Leave,
}

impl EntryAction {
    fn as_str(self) -> &'static str {
        match self {
            EntryAction::Join => "join",
            EntryAction::Leave => "leave",
        }
    }
}

/// A Join or Leave button bound to one giveaway, encoded as
/// `giveaway:<action>:<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryButton {
    pub action: EntryAction,
    pub giveaway_id: GiveawayId,
}

impl EntryButton {
    pub fn join(giveaway_id: GiveawayId) -> Self {
        Self {
            action: EntryAction::Join,
            giveaway_id,
        }
    }

    pub fn leave(giveaway_id: GiveawayId) -> Self {
        Self {
            action: EntryAction::Leave,
            giveaway_id,
        }
    }

    pub fn custom_id(&self) -> String {
        format!("{PREFIX}:{}:{}", self.action.as_str(), self.giveaway_id)
    }

    /// `None` for ids that belong to some other component.
    pub fn parse(custom_id: &str) -> Option<Self> {
        let mut parts = custom_id.splitn(3, ':');
        if parts.next()? != PREFIX {
            return None;
        }
        let action = match parts.next()? {
            "join" => EntryAction::Join,
            "leave" => EntryAction::Leave,
            _ => return None,
        };
        let giveaway_id = parts.next()?.parse().ok()?;

        Some(Self {
            action,
            giveaway_id,
        })
    }
}
