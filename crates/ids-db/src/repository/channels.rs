//! Channel repository (§3). `is_secure`/`lockdown` replace the teacher's
//! thread/forum/DM-oriented fields — this core only serves text/voice/stage/
//! announcement channels in a server.

use ids_common::models::channel::{Channel, ChannelType};
use uuid::Uuid;

pub async fn create_channel(
    pool: &sqlx::AnyPool,
    id: Uuid,
    server_id: Uuid,
    channel_type: ChannelType,
    name: &str,
    topic: Option<&str>,
    position: i32,
) -> Result<Channel, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        r#"
        INSERT INTO channels (
            id, server_id, channel_type, name, topic, position, is_secure, lockdown,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, false, false, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(server_id.to_string())
    .bind(channel_type)
    .bind(name)
    .bind(topic)
    .bind(position)
    .fetch_one(pool)
    .await
}

pub async fn list_server_channels(
    pool: &sqlx::AnyPool,
    server_id: Uuid,
) -> Result<Vec<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        "SELECT * FROM channels WHERE server_id = ? ORDER BY position, created_at",
    )
    .bind(server_id.to_string())
    .fetch_all(pool)
    .await
}

pub async fn count_server_channels(pool: &sqlx::AnyPool, server_id: Uuid) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM channels WHERE server_id = ?")
            .bind(server_id.to_string())
            .fetch_one(pool)
            .await?;
    Ok(count)
}

pub async fn find_by_id(pool: &sqlx::AnyPool, id: Uuid) -> Result<Option<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

pub async fn update_channel(
    pool: &sqlx::AnyPool,
    id: Uuid,
    name: Option<&str>,
    topic: Option<&str>,
    position: Option<i32>,
) -> Result<Channel, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        r#"
        UPDATE channels SET
            name = COALESCE(?, name),
            topic = COALESCE(?, topic),
            position = COALESCE(?, position),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(topic)
    .bind(position)
    .bind(id.to_string())
    .fetch_one(pool)
    .await
}

/// Toggle `is_secure`. Per §8's idempotence scenario, turning secure off must
/// also clear `lockdown` (toggling on → off → on restores `lockdown=false`).
pub async fn set_secure(
    pool: &sqlx::AnyPool,
    id: Uuid,
    is_secure: bool,
) -> Result<Channel, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        r#"
        UPDATE channels SET
            is_secure = ?,
            lockdown = CASE WHEN ? THEN lockdown ELSE false END,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(is_secure)
    .bind(is_secure)
    .bind(id.to_string())
    .fetch_one(pool)
    .await
}

pub async fn set_lockdown(
    pool: &sqlx::AnyPool,
    id: Uuid,
    lockdown: bool,
) -> Result<Channel, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        r#"
        UPDATE channels SET lockdown = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND is_secure = true
        RETURNING *
        "#,
    )
    .bind(lockdown)
    .bind(id.to_string())
    .fetch_one(pool)
    .await
}

pub async fn delete_channel(pool: &sqlx::AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM channels WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
