//! Read state repository — tracks where each principal has read up to per
//! channel (§4.7's `read.ack`). Mention counting and DM participation, which
//! the teacher's version joined against, are not part of this surface.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct ReadState {
    pub user_id: Uuid,
    pub channel_id: Uuid,
    pub last_read_message_id: Option<Uuid>,
    pub last_read_at: DateTime<Utc>,
}

pub async fn ack_message(
    pool: &sqlx::AnyPool,
    user_id: Uuid,
    channel_id: Uuid,
    message_id: Uuid,
) -> Result<ReadState, sqlx::Error> {
    sqlx::query_as::<_, ReadState>(
        r#"
        INSERT INTO read_states (user_id, channel_id, last_read_message_id, last_read_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT (user_id, channel_id) DO UPDATE SET
            last_read_message_id = excluded.last_read_message_id,
            last_read_at = CURRENT_TIMESTAMP
        RETURNING *
        "#,
    )
    .bind(user_id.to_string())
    .bind(channel_id.to_string())
    .bind(message_id.to_string())
    .fetch_one(pool)
    .await
}

pub async fn get_read_state(
    pool: &sqlx::AnyPool,
    user_id: Uuid,
    channel_id: Uuid,
) -> Result<Option<ReadState>, sqlx::Error> {
    sqlx::query_as::<_, ReadState>("SELECT * FROM read_states WHERE user_id = ? AND channel_id = ?")
        .bind(user_id.to_string())
        .bind(channel_id.to_string())
        .fetch_optional(pool)
        .await
}

pub async fn get_all_read_states(
    pool: &sqlx::AnyPool,
    user_id: Uuid,
) -> Result<Vec<ReadState>, sqlx::Error> {
    sqlx::query_as::<_, ReadState>("SELECT * FROM read_states WHERE user_id = ?")
        .bind(user_id.to_string())
        .fetch_all(pool)
        .await
}

pub async fn delete_server_read_states(
    pool: &sqlx::AnyPool,
    user_id: Uuid,
    server_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM read_states
        WHERE user_id = ?
        AND channel_id IN (SELECT id FROM channels WHERE server_id = ?)
        "#,
    )
    .bind(user_id.to_string())
    .bind(server_id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}
