//! Channel model (§3) — type, ordering, and the secure/lockdown flags the whole
//! engine revolves around.
//!
//! Invariants: `lockdown` may only be true when `is_secure` is true; a channel
//! cannot be deleted if it is the server's last channel (enforced in `ids-api`,
//! not here — this module carries no business logic).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Channel {
    pub id: Uuid,
    pub server_id: Uuid,
    pub channel_type: ChannelType,
    pub name: String,
    pub topic: Option<String>,
    pub position: i32,
    pub is_secure: bool,
    pub lockdown: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Text,
    Voice,
    Stage,
    Announcement,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateChannelRequest {
    #[validate(length(min = 1, max = 100, message = "channel name must be 1-100 characters"))]
    pub name: String,
    pub channel_type: ChannelType,
    #[validate(length(max = 1024))]
    pub topic: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateChannelRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 1024))]
    pub topic: Option<String>,
    pub position: Option<i32>,
}
