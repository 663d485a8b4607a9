//! SecureAuditEntry (§3) — append-only; never modified or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Allowed,
    Denied,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SecureAuditEntry {
    pub id: Uuid,
    pub server_id: Uuid,
    pub channel_id: Option<Uuid>,
    pub principal_id: Uuid,
    pub action: String,
    pub permission_checked: String,
    pub result: String,
    pub metadata: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Cursor-paginated query parameters for `GET .../secure/audit`.
#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
    pub before: Option<DateTime<Utc>>,
    pub action: Option<String>,
}

pub const AUDIT_LOG_MAX_PAGE: i64 = 200;
