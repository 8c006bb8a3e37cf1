use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // end_at is text: rows written by older deployments hold seconds, millis
    // or a formatted date, and are normalized on read.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS giveaways (
            id UUID PRIMARY KEY,
            host_ref VARCHAR(255) NOT NULL,
            channel_ref VARCHAR(255) NOT NULL,
            message_ref VARCHAR(255) NULL,
            prize TEXT NOT NULL,
            winner_count INTEGER NOT NULL,
            required_role_ref VARCHAR(255) NULL,
            participants TEXT[] NOT NULL DEFAULT '{}',
            status VARCHAR(16) NOT NULL DEFAULT 'open',
            created_at BIGINT NOT NULL,
            end_at TEXT NOT NULL,
            closed_at BIGINT NULL,
            winners TEXT[] NOT NULL DEFAULT '{}',
            purge_at BIGINT NULL,
            CONSTRAINT valid_winner_count CHECK (winner_count >= 1),
            CONSTRAINT valid_status CHECK (status IN ('open', 'closed'))
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_giveaways_status ON giveaways(status);
        CREATE INDEX IF NOT EXISTS idx_giveaways_purge_at ON giveaways(purge_at);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
