use std::time::Duration;

use eyre::Result;
use giveaways_core::errors::{EntryError, GiveawayError};
use giveaways_core::lifecycle::CloseResult;
use giveaways_core::models::{GiveawayId, GiveawayRecord, NewGiveaway, ParticipantId, Timestamp};
use serenity::model::application::interaction::{
    InteractionResponseType,
    application_command::{ApplicationCommandInteraction, CommandDataOption},
    message_component::MessageComponentInteraction,
};
use tracing::info;

use crate::components::{EntryAction, EntryButton};
use crate::eligibility::MemberRoles;
use crate::handlers::HandlerContext;

/// Longest giveaway accepted from the command: four weeks.
pub const MAX_DURATION_MINUTES: i64 = 4 * 7 * 24 * 60;

/// Most winners a single command may ask for.
pub const MAX_WINNERS: i64 = 50;

/// Validated arguments of `/giveaway start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub prize: String,
    pub duration: Duration,
    pub winner_count: u32,
    pub required_role: Option<String>,
}

impl StartRequest {
    /// Check raw option values, returning a message for the user on failure.
    pub fn from_options(
        prize: Option<&str>,
        duration_minutes: Option<i64>,
        winners: Option<i64>,
        role: Option<&str>,
    ) -> std::result::Result<Self, String> {
        let prize = prize.map(str::trim).unwrap_or_default();
        if prize.is_empty() {
            return Err("Please name a prize.".to_string());
        }

        let minutes = duration_minutes.ok_or("Please give a duration in minutes.")?;
        if !(1..=MAX_DURATION_MINUTES).contains(&minutes) {
            return Err(format!(
                "Duration must be between 1 and {} minutes.",
                MAX_DURATION_MINUTES
            ));
        }

        let winners = winners.ok_or("Please give a number of winners.")?;
        if !(1..=MAX_WINNERS).contains(&winners) {
            return Err(format!("Winners must be between 1 and {}.", MAX_WINNERS));
        }

        Ok(Self {
            prize: prize.to_string(),
            duration: Duration::from_secs(minutes.unsigned_abs() * 60),
            winner_count: winners.unsigned_abs() as u32,
            required_role: role.map(str::to_string),
        })
    }

    pub fn into_new_giveaway(self, host_ref: String, channel_ref: String, now: Timestamp) -> NewGiveaway {
        NewGiveaway {
            host_ref,
            channel_ref,
            message_ref: None,
            prize: self.prize,
            winner_count: self.winner_count,
            required_role_ref: self.required_role,
            end_at: now.saturating_add(self.duration),
        }
    }
}

/// Whether `/giveaway end` run in `channel_ref` may end `record`.
///
/// Only the channel a giveaway was posted in can end it; ids are public, so a
/// manager of one server must not reach giveaways of another.
pub fn may_end_from(record: &GiveawayRecord, channel_ref: &str) -> bool {
    record.channel_ref == channel_ref
}

/// What to tell a participant after they pressed Join or Leave.
pub fn entry_reply(action: EntryAction, result: &std::result::Result<usize, EntryError>) -> Option<String> {
    let reply = match (action, result) {
        (EntryAction::Join, Ok(count)) => {
            format!("You're in! There are now {} entries.", count)
        }
        (EntryAction::Leave, Ok(_)) => "You have left the giveaway.".to_string(),
        (_, Err(EntryError::NotFound(_))) => "This giveaway no longer exists.".to_string(),
        (_, Err(EntryError::Store(_))) => return None,
        (_, Err(e)) => e.to_string(),
    };
    Some(reply)
}

/// Handle the /giveaway command
pub async fn handle_giveaway_command(
    ctx: HandlerContext,
    command: &ApplicationCommandInteraction,
) -> Result<()> {
    let subcommand = command
        .data
        .options
        .first()
        .ok_or_else(|| eyre::eyre!("Missing subcommand"))?;

    match subcommand.name.as_str() {
        "start" => handle_giveaway_start(ctx, command, subcommand).await,
        "end" => handle_giveaway_end(ctx, command, subcommand).await,
        _ => reply(&ctx, command, "Unknown subcommand").await,
    }
}

/// Handle the /giveaway start subcommand
async fn handle_giveaway_start(
    ctx: HandlerContext,
    command: &ApplicationCommandInteraction,
    subcommand: &CommandDataOption,
) -> Result<()> {
    let request = match StartRequest::from_options(
        get_option_str(subcommand, "prize"),
        get_option_i64(subcommand, "duration"),
        get_option_i64(subcommand, "winners"),
        get_option_str(subcommand, "role"),
    ) {
        Ok(request) => request,
        Err(message) => return reply(&ctx, command, &message).await,
    };

    let new = request.into_new_giveaway(
        command.user.id.to_string(),
        command.channel_id.to_string(),
        Timestamp::now(),
    );

    match ctx.engine.create(new).await {
        Ok(record) => {
            info!(giveaway_id = %record.id, host = %command.user.id, "Giveaway started from command");
            reply(
                &ctx,
                command,
                &format!("Giveaway for **{}** started. Id: `{}`", record.prize, record.id),
            )
            .await
        }
        Err(GiveawayError::Validation(message)) => reply(&ctx, command, &message).await,
        Err(e) => Err(e.into()),
    }
}

/// Handle the /giveaway end subcommand
async fn handle_giveaway_end(
    ctx: HandlerContext,
    command: &ApplicationCommandInteraction,
    subcommand: &CommandDataOption,
) -> Result<()> {
    let Some(id) = get_option_str(subcommand, "id").and_then(|id| id.trim().parse::<GiveawayId>().ok())
    else {
        return reply(&ctx, command, "That is not a valid giveaway id.").await;
    };

    match ctx.engine.get(id).await {
        Ok(record) if may_end_from(&record, &command.channel_id.to_string()) => {}
        Ok(_) => {
            info!(
                giveaway_id = %id,
                channel = %command.channel_id,
                "Refused to end giveaway from another channel"
            );
            return reply(&ctx, command, "No giveaway with that id exists in this channel.").await;
        }
        Err(GiveawayError::NotFound(_)) => {
            return reply(&ctx, command, "No giveaway with that id exists in this channel.").await;
        }
        Err(e) => return Err(e.into()),
    }

    let message = match ctx.engine.end_now(id).await {
        Ok(CloseResult::Closed { winners }) => {
            format!("Giveaway ended with {} winner(s).", winners.len())
        }
        Ok(CloseResult::AlreadyClosed) => "That giveaway has already ended.".to_string(),
        Err(GiveawayError::NotFound(_)) => "No giveaway with that id exists.".to_string(),
        Err(e) => return Err(e.into()),
    };
    reply(&ctx, command, &message).await
}

/// Handle the Join and Leave buttons on a giveaway message
pub async fn handle_component_interaction(
    ctx: HandlerContext,
    component: &MessageComponentInteraction,
) -> Result<()> {
    let Some(button) = EntryButton::parse(&component.data.custom_id) else {
        return Ok(());
    };
    let participant = ParticipantId::from(component.user.id.to_string());

    let result = match button.action {
        EntryAction::Join => {
            let roles = MemberRoles::from_member(component.member.as_ref());
            ctx.engine
                .join_checked(button.giveaway_id, &participant, &roles)
                .await
        }
        EntryAction::Leave => ctx.engine.leave(button.giveaway_id, &participant).await,
    };

    let Some(message) = entry_reply(button.action, &result) else {
        return result.map(|_| ()).map_err(Into::into);
    };

    component
        .create_interaction_response(&ctx.ctx.http, |r| {
            r.kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|m| m.content(message).ephemeral(true))
        })
        .await?;

    Ok(())
}

async fn reply(ctx: &HandlerContext, command: &ApplicationCommandInteraction, message: &str) -> Result<()> {
    command
        .create_interaction_response(&ctx.ctx.http, |r| {
            r.kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|m| m.content(message).ephemeral(true))
        })
        .await?;

    Ok(())
}

/// Extract a string option from a subcommand
fn get_option_str<'a>(options: &'a CommandDataOption, name: &str) -> Option<&'a str> {
    options
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_ref())
        .and_then(|val| val.as_str())
}

/// Extract an integer option from a subcommand
fn get_option_i64(options: &CommandDataOption, name: &str) -> Option<i64> {
    options
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_ref())
        .and_then(|val| val.as_i64())
}
