use std::sync::Arc;

use eyre::Result;
use giveaways_core::GiveawayEngine;
use giveaways_db::{DbPool, PgGiveawayStore};
use serenity::{Client, http::Http, prelude::GatewayIntents};
use tracing::info;

pub mod commands;
pub mod components;
pub mod config;
pub mod eligibility;
pub mod handlers;
pub mod notifier;

/// Start the Discord bot with the provided configuration and database connection.
///
/// The giveaway engine is started first, so giveaways that ended while the bot
/// was down are closed and announced before any interaction is accepted. Runs
/// until the gateway connection ends.
pub async fn start_bot(config: config::BotConfig, db_pool: DbPool) -> Result<()> {
    info!("Starting Discord bot");

    let http = Arc::new(Http::new(&config.token));
    let store = Arc::new(PgGiveawayStore::new(db_pool));
    let notifier = Arc::new(notifier::DiscordNotifier::new(Arc::clone(&http)));
    let engine = Arc::new(GiveawayEngine::start(store, notifier, config.engine.clone()).await?);

    let report = engine.restoration_report();
    info!(
        closed = report.closed,
        armed = report.armed,
        "Giveaways restored"
    );

    let handler = handlers::Handler::new(config.clone(), Arc::clone(&engine));
    let mut client = Client::builder(&config.token, GatewayIntents::non_privileged())
        .application_id(config.application_id)
        .event_handler(handler)
        .await?;

    info!("Connecting to Discord...");
    let result = client.start().await;

    engine.shutdown().await;
    result?;

    Ok(())
}
