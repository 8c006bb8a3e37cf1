use std::sync::Arc;

use giveaways_core::GiveawayEngine;
use serenity::{
    async_trait,
    model::{
        application::{
            command::Command,
            interaction::{Interaction, InteractionResponseType},
        },
        gateway::Ready,
        id::GuildId,
    },
    prelude::*,
};
use tracing::{error, info};

pub mod giveaway;

use crate::config::BotConfig;

/// Main Discord handler that processes all events.
///
/// Holds the bot configuration and the giveaway engine, which was already
/// started (and restored) before the gateway connection opened.
pub struct Handler {
    config: BotConfig,
    engine: Arc<GiveawayEngine>,
}

impl Handler {
    /// Create a new handler
    pub fn new(config: BotConfig, engine: Arc<GiveawayEngine>) -> Self {
        Self { config, engine }
    }

    fn context(&self, ctx: Context) -> HandlerContext {
        HandlerContext {
            ctx,
            engine: Arc::clone(&self.engine),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    /// Handle ready events (when bot connects to Discord)
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        // Guild commands show up immediately; global ones can take an hour.
        let registered = match self.config.test_guild_id {
            Some(test_guild_id) => GuildId(test_guild_id)
                .set_application_commands(&ctx.http, |commands| {
                    crate::commands::register_commands(commands)
                })
                .await,
            None => {
                Command::set_global_application_commands(&ctx.http, |commands| {
                    crate::commands::register_commands(commands)
                })
                .await
            }
        };

        match registered {
            Ok(cmds) => {
                for cmd in &cmds {
                    info!("Command registered: /{} - {}", cmd.name, cmd.description);
                }
            }
            Err(why) => error!("Error registering commands: {:?}", why),
        }
    }

    /// Handle interactions (slash commands, buttons, etc.)
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::ApplicationCommand(command) => {
                info!("Received command: {}", command.data.name);

                let result = match command.data.name.as_str() {
                    "giveaway" => {
                        giveaway::handle_giveaway_command(self.context(ctx.clone()), &command).await
                    }
                    _ => {
                        error!("Unknown command: {}", command.data.name);
                        Err(eyre::eyre!("Unknown command"))
                    }
                };

                if let Err(e) = result {
                    error!("Error handling command: {:?}", e);

                    if let Err(why) = command
                        .create_interaction_response(&ctx.http, |r| {
                            r.kind(InteractionResponseType::ChannelMessageWithSource)
                                .interaction_response_data(|m| {
                                    m.content("Something went wrong, please try again.")
                                        .ephemeral(true)
                                })
                        })
                        .await
                    {
                        error!("Failed to send error response: {:?}", why);
                    }
                }
            }
            Interaction::MessageComponent(component) => {
                if let Err(e) =
                    giveaway::handle_component_interaction(self.context(ctx.clone()), &component).await
                {
                    error!("Error handling component interaction: {:?}", e);

                    if let Err(why) = component
                        .create_interaction_response(&ctx.http, |r| {
                            r.kind(InteractionResponseType::ChannelMessageWithSource)
                                .interaction_response_data(|m| {
                                    m.content("Something went wrong, please try again.")
                                        .ephemeral(true)
                                })
                        })
                        .await
                    {
                        error!("Failed to send error response: {:?}", why);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Shared context for command handlers.
pub struct HandlerContext {
    pub ctx: Context,
    pub engine: Arc<GiveawayEngine>,
}
