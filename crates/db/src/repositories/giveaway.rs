use eyre::Result;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::models::DbGiveaway;

#[allow(clippy::too_many_arguments)]
pub async fn create_giveaway(
    pool: &Pool<Postgres>,
    id: Uuid,
    host_ref: &str,
    channel_ref: &str,
    message_ref: Option<&str>,
    prize: &str,
    winner_count: i32,
    required_role_ref: Option<&str>,
    created_at: i64,
    end_at: i64,
) -> Result<DbGiveaway> {
    let giveaway = sqlx::query_as::<_, DbGiveaway>(
        r#"
        INSERT INTO giveaways (id, host_ref, channel_ref, message_ref, prize, winner_count,
                               required_role_ref, created_at, end_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, host_ref, channel_ref, message_ref, prize, winner_count, required_role_ref,
                  participants, status, created_at, end_at, closed_at, winners, purge_at
        "#,
    )
    .bind(id)
    .bind(host_ref)
    .bind(channel_ref)
    .bind(message_ref)
    .bind(prize)
    .bind(winner_count)
    .bind(required_role_ref)
    .bind(created_at)
    .bind(end_at.to_string())
    .fetch_one(pool)
    .await?;

    Ok(giveaway)
}

pub async fn get_giveaway_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbGiveaway>> {
    let giveaway = sqlx::query_as::<_, DbGiveaway>(
        r#"
        SELECT id, host_ref, channel_ref, message_ref, prize, winner_count, required_role_ref,
               participants, status, created_at, end_at, closed_at, winners, purge_at
        FROM giveaways
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(giveaway)
}

/// Row-lock a giveaway for the rest of the caller's transaction.
pub async fn lock_giveaway(conn: &mut PgConnection, id: Uuid) -> Result<Option<DbGiveaway>> {
    let giveaway = sqlx::query_as::<_, DbGiveaway>(
        r#"
        SELECT id, host_ref, channel_ref, message_ref, prize, winner_count, required_role_ref,
               participants, status, created_at, end_at, closed_at, winners, purge_at
        FROM giveaways
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(giveaway)
}

pub async fn set_participants(
    conn: &mut PgConnection,
    id: Uuid,
    participants: &[String],
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE giveaways
        SET participants = $2
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(participants)
    .execute(conn)
    .await?;

    Ok(())
}

/// Close a giveaway only if it is still open and its participants still match
/// `snapshot`, which must be sorted bytewise. Returns whether a row changed.
pub async fn close_giveaway(
    pool: &Pool<Postgres>,
    id: Uuid,
    snapshot: &[String],
    winners: &[String],
    closed_at: i64,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE giveaways
        SET status = 'closed', winners = $2, closed_at = $3
        WHERE id = $1
          AND status = 'open'
          AND COALESCE(
                (SELECT array_agg(p ORDER BY p COLLATE "C") FROM unnest(participants) AS p),
                '{}'::text[]
              ) = $4
        "#,
    )
    .bind(id)
    .bind(winners)
    .bind(closed_at)
    .bind(snapshot)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn get_giveaway_status(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<String>> {
    let status = sqlx::query_scalar::<_, String>(
        r#"
        SELECT status
        FROM giveaways
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(status)
}

pub async fn set_purge_at(pool: &Pool<Postgres>, id: Uuid, purge_at: i64) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE giveaways
        SET purge_at = $2
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(purge_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn set_message_ref(pool: &Pool<Postgres>, id: Uuid, message_ref: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE giveaways
        SET message_ref = $2
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(message_ref)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_open_giveaways(pool: &Pool<Postgres>) -> Result<Vec<DbGiveaway>> {
    let giveaways = sqlx::query_as::<_, DbGiveaway>(
        r#"
        SELECT id, host_ref, channel_ref, message_ref, prize, winner_count, required_role_ref,
               participants, status, created_at, end_at, closed_at, winners, purge_at
        FROM giveaways
        WHERE status = 'open'
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(giveaways)
}

pub async fn get_closed_giveaways_past(
    pool: &Pool<Postgres>,
    deadline: i64,
) -> Result<Vec<DbGiveaway>> {
    let giveaways = sqlx::query_as::<_, DbGiveaway>(
        r#"
        SELECT id, host_ref, channel_ref, message_ref, prize, winner_count, required_role_ref,
               participants, status, created_at, end_at, closed_at, winners, purge_at
        FROM giveaways
        WHERE status = 'closed' AND purge_at <= $1
        "#,
    )
    .bind(deadline)
    .fetch_all(pool)
    .await?;

    Ok(giveaways)
}

pub async fn get_closed_giveaways_without_purge(pool: &Pool<Postgres>) -> Result<Vec<DbGiveaway>> {
    let giveaways = sqlx::query_as::<_, DbGiveaway>(
        r#"
        SELECT id, host_ref, channel_ref, message_ref, prize, winner_count, required_role_ref,
               participants, status, created_at, end_at, closed_at, winners, purge_at
        FROM giveaways
        WHERE status = 'closed' AND purge_at IS NULL
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(giveaways)
}

pub async fn delete_giveaway(pool: &Pool<Postgres>, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM giveaways
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
