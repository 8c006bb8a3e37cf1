use std::sync::Arc;

use async_trait::async_trait;
use eyre::{WrapErr, eyre};
use giveaways_core::errors::NotifyError;
use giveaways_core::models::{GiveawayRecord, ParticipantId};
use giveaways_core::notifier::Notifier;
use serenity::builder::{CreateComponents, CreateEmbed};
use serenity::http::Http;
use serenity::model::application::component::ButtonStyle;
use serenity::model::id::{ChannelId, MessageId};
use serenity::utils::Color;
use tracing::debug;

use crate::components::EntryButton;

/// Announces giveaways in the channel they were started from.
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn channel_of(record: &GiveawayRecord) -> Result<ChannelId, NotifyError> {
    record
        .channel_ref
        .parse::<u64>()
        .map(ChannelId)
        .map_err(|_| NotifyError(eyre!("Invalid channel reference: {}", record.channel_ref)))
}

fn message_of(record: &GiveawayRecord) -> Option<MessageId> {
    record
        .message_ref
        .as_deref()
        .and_then(|message| message.parse::<u64>().ok())
        .map(MessageId)
}

/// Mention each winner, in draw order.
pub fn format_winners(winners: &[ParticipantId]) -> String {
    winners
        .iter()
        .map(|winner| format!("<@{}>", winner))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn open_description(record: &GiveawayRecord) -> String {
    let mut description = format!(
        "Hosted by <@{}>\nWinners: **{}**\nEnds <t:{}:R>",
        record.host_ref,
        record.winner_count,
        record.end_at.as_unix_seconds()
    );
    if let Some(role) = &record.required_role_ref {
        description.push_str(&format!("\nRequires <@&{}>", role));
    }
    description
}

pub fn closed_description(record: &GiveawayRecord, winners: &[ParticipantId]) -> String {
    if winners.is_empty() {
        format!(
            "Hosted by <@{}>\nNobody entered, so there are no winners.",
            record.host_ref
        )
    } else {
        format!(
            "Hosted by <@{}>\nEntries: **{}**\nWinners: {}",
            record.host_ref,
            record.participants.len(),
            format_winners(winners)
        )
    }
}

fn open_embed(record: &GiveawayRecord) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed
        .title(format!("🎉 {}", record.prize))
        .description(open_description(record))
        .color(Color::GOLD)
        .footer(|f| f.text(format!("Giveaway {}", record.id)));
    embed
}

fn closed_embed(record: &GiveawayRecord, winners: &[ParticipantId]) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed
        .title(format!("{} (ended)", record.prize))
        .description(closed_description(record, winners))
        .color(Color::DARK_GREY)
        .footer(|f| f.text(format!("Giveaway {}", record.id)));
    embed
}

fn entry_buttons(record: &GiveawayRecord) -> CreateComponents {
    let mut components = CreateComponents::default();
    components.create_action_row(|row| {
        row.create_button(|b| {
            b.custom_id(EntryButton::join(record.id).custom_id())
                .label("Join")
                .style(ButtonStyle::Success)
        })
        .create_button(|b| {
            b.custom_id(EntryButton::leave(record.id).custom_id())
                .label("Leave")
                .style(ButtonStyle::Secondary)
        })
    });
    components
}

impl DiscordNotifier {
    /// Swap the live embed for the final one and drop the buttons. Falls back
    /// to a fresh message when the original cannot be edited.
    async fn post_result(
        &self,
        record: &GiveawayRecord,
        winners: &[ParticipantId],
    ) -> Result<(), NotifyError> {
        let channel = channel_of(record)?;
        let embed = closed_embed(record, winners);

        let edited = match message_of(record) {
            Some(message) => channel
                .edit_message(&self.http, message, |m| {
                    m.set_embed(embed.clone()).components(|c| c)
                })
                .await
                .map(|_| true)
                .unwrap_or_else(|e| {
                    debug!(giveaway_id = %record.id, "Could not edit giveaway message: {}", e);
                    false
                }),
            None => false,
        };
        if !edited {
            channel
                .send_message(&self.http, |m| m.set_embed(embed))
                .await
                .wrap_err("Failed to post giveaway results")?;
        }

        let announcement = if winners.is_empty() {
            format!("The giveaway for **{}** ended with no participants.", record.prize)
        } else {
            format!(
                "Congratulations {}! You won **{}**!",
                format_winners(winners),
                record.prize
            )
        };
        channel
            .say(&self.http, announcement)
            .await
            .wrap_err("Failed to announce giveaway winners")?;

        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn announce_open(&self, record: &GiveawayRecord) -> Result<Option<String>, NotifyError> {
        let channel = channel_of(record)?;
        let message = channel
            .send_message(&self.http, |m| {
                m.set_embed(open_embed(record))
                    .set_components(entry_buttons(record))
            })
            .await
            .wrap_err("Failed to post giveaway")?;

        Ok(Some(message.id.to_string()))
    }

    async fn announce_closed(
        &self,
        record: &GiveawayRecord,
        winners: &[ParticipantId],
    ) -> Result<(), NotifyError> {
        self.post_result(record, winners).await
    }

    async fn announce_no_participants(&self, record: &GiveawayRecord) -> Result<(), NotifyError> {
        self.post_result(record, &[]).await
    }
}
