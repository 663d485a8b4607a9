//! ChannelRoleOverride and ChannelUserOverride (§3) — per-(channel, role) and
//! per-(channel, principal) `(allow, deny)` bitfield pairs. `deny` always wins
//! on any bit present in both, at every step they are applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ChannelRoleOverride {
    pub channel_id: Uuid,
    pub role_id: Uuid,
    pub allow: i64,
    pub deny: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ChannelUserOverride {
    pub channel_id: Uuid,
    pub user_id: Uuid,
    pub allow: i64,
    pub deny: i64,
    pub updated_at: DateTime<Utc>,
}

/// Body for `PUT .../user-overrides/{u}` — decimal-string bitfields on the wire (§6).
#[derive(Debug, Deserialize)]
pub struct SetUserOverrideRequest {
    pub allow_permissions: String,
    pub deny_permissions: String,
}
