//! MemberRole (§3) — a (server, principal, role) triple. First-class join
//! table, replacing the teacher's Postgres-only `roles UUID[]` column (which
//! did not port to the SQLite "lite mode" the same crate claims to support).

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MemberRole {
    pub server_id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}
