//! Secure-channel audit log (§3, §4.5). Append-only — no update or delete
//! function exists here by design.

use ids_common::models::audit::{AuditLogQuery, AuditResult, SecureAuditEntry, AUDIT_LOG_MAX_PAGE};
use uuid::Uuid;

#[allow(clippy::too_many_arguments)]
pub async fn append(
    pool: &sqlx::AnyPool,
    id: Uuid,
    server_id: Uuid,
    channel_id: Option<Uuid>,
    principal_id: Uuid,
    action: &str,
    permission_checked: &str,
    result: AuditResult,
    metadata: Option<&str>,
    ip: Option<&str>,
    user_agent: Option<&str>,
) -> Result<SecureAuditEntry, sqlx::Error> {
    let result_str = match result {
        AuditResult::Allowed => "allowed",
        AuditResult::Denied => "denied",
    };
    sqlx::query_as::<_, SecureAuditEntry>(
        r#"
        INSERT INTO secure_audit_log (
            id, server_id, channel_id, principal_id, action, permission_checked,
            result, metadata, ip, user_agent, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(server_id.to_string())
    .bind(channel_id.map(|c| c.to_string()))
    .bind(principal_id.to_string())
    .bind(action)
    .bind(permission_checked)
    .bind(result_str)
    .bind(metadata)
    .bind(ip)
    .bind(user_agent)
    .fetch_one(pool)
    .await
}

/// Cursor-paginated list, newest first, capped at `AUDIT_LOG_MAX_PAGE` per page.
pub async fn list(
    pool: &sqlx::AnyPool,
    server_id: Uuid,
    channel_id: Option<Uuid>,
    query: &AuditLogQuery,
) -> Result<Vec<SecureAuditEntry>, sqlx::Error> {
    let limit = query
        .limit
        .unwrap_or(AUDIT_LOG_MAX_PAGE)
        .clamp(1, AUDIT_LOG_MAX_PAGE);

    sqlx::query_as::<_, SecureAuditEntry>(
        r#"
        SELECT * FROM secure_audit_log
        WHERE server_id = ?
            AND (? IS NULL OR channel_id = ?)
            AND (? IS NULL OR created_at < ?)
            AND (? IS NULL OR action = ?)
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(server_id.to_string())
    .bind(channel_id.map(|c| c.to_string()))
    .bind(channel_id.map(|c| c.to_string()))
    .bind(query.before)
    .bind(query.before)
    .bind(query.action.as_deref())
    .bind(query.action.as_deref())
    .bind(limit)
    .fetch_all(pool)
    .await
}
