//! Per-channel role and user permission overrides (§3, §4.2 step 5-6).

use ids_common::models::channel_override::{ChannelRoleOverride, ChannelUserOverride};
use uuid::Uuid;

pub async fn list_role_overrides(
    pool: &sqlx::AnyPool,
    channel_id: Uuid,
) -> Result<Vec<ChannelRoleOverride>, sqlx::Error> {
    sqlx::query_as::<_, ChannelRoleOverride>(
        "SELECT * FROM channel_role_overrides WHERE channel_id = ?",
    )
    .bind(channel_id.to_string())
    .fetch_all(pool)
    .await
}

pub async fn get_role_override(
    pool: &sqlx::AnyPool,
    channel_id: Uuid,
    role_id: Uuid,
) -> Result<Option<ChannelRoleOverride>, sqlx::Error> {
    sqlx::query_as::<_, ChannelRoleOverride>(
        "SELECT * FROM channel_role_overrides WHERE channel_id = ? AND role_id = ?",
    )
    .bind(channel_id.to_string())
    .bind(role_id.to_string())
    .fetch_optional(pool)
    .await
}

pub async fn set_role_override(
    pool: &sqlx::AnyPool,
    channel_id: Uuid,
    role_id: Uuid,
    allow: i64,
    deny: i64,
) -> Result<ChannelRoleOverride, sqlx::Error> {
    sqlx::query_as::<_, ChannelRoleOverride>(
        r#"
        INSERT INTO channel_role_overrides (channel_id, role_id, allow, deny, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT (channel_id, role_id) DO UPDATE SET
            allow = excluded.allow,
            deny = excluded.deny,
            updated_at = CURRENT_TIMESTAMP
        RETURNING *
        "#,
    )
    .bind(channel_id.to_string())
    .bind(role_id.to_string())
    .bind(allow)
    .bind(deny)
    .fetch_one(pool)
    .await
}

pub async fn remove_role_override(
    pool: &sqlx::AnyPool,
    channel_id: Uuid,
    role_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM channel_role_overrides WHERE channel_id = ? AND role_id = ?")
        .bind(channel_id.to_string())
        .bind(role_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_user_overrides(
    pool: &sqlx::AnyPool,
    channel_id: Uuid,
) -> Result<Vec<ChannelUserOverride>, sqlx::Error> {
    sqlx::query_as::<_, ChannelUserOverride>(
        "SELECT * FROM channel_user_overrides WHERE channel_id = ?",
    )
    .bind(channel_id.to_string())
    .fetch_all(pool)
    .await
}

pub async fn get_user_override(
    pool: &sqlx::AnyPool,
    channel_id: Uuid,
    user_id: Uuid,
) -> Result<Option<ChannelUserOverride>, sqlx::Error> {
    sqlx::query_as::<_, ChannelUserOverride>(
        "SELECT * FROM channel_user_overrides WHERE channel_id = ? AND user_id = ?",
    )
    .bind(channel_id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await
}

pub async fn set_user_override(
    pool: &sqlx::AnyPool,
    channel_id: Uuid,
    user_id: Uuid,
    allow: i64,
    deny: i64,
) -> Result<ChannelUserOverride, sqlx::Error> {
    sqlx::query_as::<_, ChannelUserOverride>(
        r#"
        INSERT INTO channel_user_overrides (channel_id, user_id, allow, deny, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT (channel_id, user_id) DO UPDATE SET
            allow = excluded.allow,
            deny = excluded.deny,
            updated_at = CURRENT_TIMESTAMP
        RETURNING *
        "#,
    )
    .bind(channel_id.to_string())
    .bind(user_id.to_string())
    .bind(allow)
    .bind(deny)
    .fetch_one(pool)
    .await
}

pub async fn remove_user_override(
    pool: &sqlx::AnyPool,
    channel_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM channel_user_overrides WHERE channel_id = ? AND user_id = ?")
        .bind(channel_id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
