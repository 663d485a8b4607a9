//! VoiceMembership (§3) — at most one row per principal across the entire
//! platform. Joining a second voice channel implicitly leaves the first. Rows
//! whose `last_heartbeat` is older than the configured timeout (default 45s)
//! are reaped on any read or mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VoiceMembership {
    pub server_id: Uuid,
    pub channel_id: Uuid,
    pub user_id: Uuid,
    pub muted: bool,
    pub deafened: bool,
    pub camera_on: bool,
    pub stage_speaker: bool,
    pub stage_requesting: bool,
    pub last_heartbeat: DateTime<Utc>,
    pub fingerprint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoiceStateUpdateRequest {
    pub muted: Option<bool>,
    pub deafened: Option<bool>,
    pub camera_on: Option<bool>,
}
