use eyre::{Result, WrapErr, eyre};
use giveaways_core::config::EngineConfig;
use std::env;
use tracing::Level;

/// Configuration for the Discord bot.
///
/// Everything the bot needs to connect to Discord and the database, plus the
/// engine settings it hands to the giveaway engine at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Discord bot token (required)
    pub token: String,
    /// Application ID for Discord bot (required)
    pub application_id: u64,
    /// Database connection URL (required)
    pub database_url: String,
    /// Test guild ID for faster command registration during development
    pub test_guild_id: Option<u64>,
    /// Maximum log level (defaults to INFO)
    pub log_level: Level,
    /// Lifecycle, retention and draw settings
    pub engine: EngineConfig,
}

impl BotConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let token = env::var("DISCORD_TOKEN")
            .map_err(|_| eyre!("DISCORD_TOKEN environment variable not set"))?;

        let application_id = env::var("DISCORD_APPLICATION_ID")
            .map_err(|_| eyre!("DISCORD_APPLICATION_ID environment variable not set"))?
            .parse::<u64>()
            .map_err(|_| eyre!("DISCORD_APPLICATION_ID must be a valid u64"))?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| eyre!("DATABASE_URL environment variable not set"))?;

        // Optional test guild ID for development
        let test_guild_id = env::var("DISCORD_TEST_GUILD_ID")
            .ok()
            .and_then(|id| id.parse::<u64>().ok());

        let log_level = match env::var("LOG_LEVEL") {
            Ok(level) => parse_log_level(&level)?,
            Err(_) => Level::INFO,
        };

        let engine = EngineConfig::from_env().wrap_err("Invalid giveaway engine configuration")?;

        Ok(Self {
            token,
            application_id,
            database_url,
            test_guild_id,
            log_level,
            engine,
        })
    }
}

/// Parse a `LOG_LEVEL` value, case-insensitively.
pub fn parse_log_level(value: &str) -> Result<Level> {
    value
        .trim()
        .parse::<Level>()
        .map_err(|_| eyre!("LOG_LEVEL must be one of trace, debug, info, warn, error (got {value:?})"))
}
