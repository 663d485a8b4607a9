//! Member model (§3) — a (server, principal) pair. Role assignment is tracked
//! separately by the first-class `MemberRole` join (see `member_role.rs`), not
//! an inline array column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub user_id: Uuid,
    pub server_id: Uuid,
    pub nickname: Option<String>,
    pub joined_at: DateTime<Utc>,
}

/// A member with its resolved role ids attached — the shape REST responses use.
#[derive(Debug, Clone, Serialize)]
pub struct MemberWithRoles {
    pub user_id: Uuid,
    pub server_id: Uuid,
    pub nickname: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub role_ids: Vec<Uuid>,
}
