//! Voice membership repository (§3, §4.8). At most one row per `user_id`
//! platform-wide — `join` upserts by `user_id` alone so switching channels
//! implicitly leaves whichever one the row previously pointed at.

use chrono::{DateTime, Utc};
use ids_common::models::voice_membership::VoiceMembership;
use uuid::Uuid;

pub async fn find_by_user(
    pool: &sqlx::AnyPool,
    user_id: Uuid,
) -> Result<Option<VoiceMembership>, sqlx::Error> {
    sqlx::query_as::<_, VoiceMembership>("SELECT * FROM voice_memberships WHERE user_id = ?")
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await
}

pub async fn list_by_channel(
    pool: &sqlx::AnyPool,
    channel_id: Uuid,
) -> Result<Vec<VoiceMembership>, sqlx::Error> {
    sqlx::query_as::<_, VoiceMembership>("SELECT * FROM voice_memberships WHERE channel_id = ?")
        .bind(channel_id.to_string())
        .fetch_all(pool)
        .await
}

pub async fn join(
    pool: &sqlx::AnyPool,
    server_id: Uuid,
    channel_id: Uuid,
    user_id: Uuid,
) -> Result<VoiceMembership, sqlx::Error> {
    sqlx::query_as::<_, VoiceMembership>(
        r#"
        INSERT INTO voice_memberships (
            server_id, channel_id, user_id, muted, deafened, camera_on,
            stage_speaker, stage_requesting, last_heartbeat, fingerprint
        )
        VALUES (?, ?, ?, false, false, false, false, false, CURRENT_TIMESTAMP, NULL)
        ON CONFLICT (user_id) DO UPDATE SET
            server_id = excluded.server_id,
            channel_id = excluded.channel_id,
            muted = false,
            deafened = false,
            camera_on = false,
            stage_speaker = false,
            stage_requesting = false,
            last_heartbeat = CURRENT_TIMESTAMP,
            fingerprint = NULL
        RETURNING *
        "#,
    )
    .bind(server_id.to_string())
    .bind(channel_id.to_string())
    .bind(user_id.to_string())
    .fetch_one(pool)
    .await
}

pub async fn leave(pool: &sqlx::AnyPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM voice_memberships WHERE user_id = ?")
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_state(
    pool: &sqlx::AnyPool,
    user_id: Uuid,
    muted: Option<bool>,
    deafened: Option<bool>,
    camera_on: Option<bool>,
) -> Result<VoiceMembership, sqlx::Error> {
    sqlx::query_as::<_, VoiceMembership>(
        r#"
        UPDATE voice_memberships SET
            muted = COALESCE(?, muted),
            deafened = COALESCE(?, deafened),
            camera_on = COALESCE(?, camera_on)
        WHERE user_id = ?
        RETURNING *
        "#,
    )
    .bind(muted)
    .bind(deafened)
    .bind(camera_on)
    .bind(user_id.to_string())
    .fetch_one(pool)
    .await
}

pub async fn set_stage_speaker(
    pool: &sqlx::AnyPool,
    user_id: Uuid,
    speaker: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE voice_memberships SET stage_speaker = ?, stage_requesting = false WHERE user_id = ?",
    )
    .bind(speaker)
    .bind(user_id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_stage_requesting(
    pool: &sqlx::AnyPool,
    user_id: Uuid,
    requesting: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE voice_memberships SET stage_requesting = ? WHERE user_id = ?")
        .bind(requesting)
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_fingerprint(
    pool: &sqlx::AnyPool,
    user_id: Uuid,
    fingerprint: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE voice_memberships SET fingerprint = ? WHERE user_id = ?")
        .bind(fingerprint)
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn touch_heartbeat(pool: &sqlx::AnyPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE voice_memberships SET last_heartbeat = CURRENT_TIMESTAMP WHERE user_id = ?")
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete rows whose heartbeat predates `cutoff` — periodic sweep mirroring the
/// rate limiter's window cleanup, called from the same background task.
pub async fn reap_stale(pool: &sqlx::AnyPool, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM voice_memberships WHERE last_heartbeat < ?")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
