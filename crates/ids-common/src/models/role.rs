//! Role model (§3). Position 0 is reserved for the implicit `@everyone` role,
//! which always exists and can neither be deleted nor renamed. `security_level`
//! must be one of {0,30,50,70,80,90,100}; `is_admin` grants the C2 admin bypass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Valid `security_level` values, per the GLOSSARY hierarchy
/// user→trusted→moderator→security_admin→admin→co_owner→owner.
pub const VALID_SECURITY_LEVELS: [i32; 7] = [0, 30, 50, 70, 80, 90, 100];

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: Uuid,
    pub server_id: Uuid,
    pub name: String,
    pub color: Option<i32>,
    pub hoist: bool,
    pub icon: Option<String>,
    pub position: i32,
    /// Decimal-string bitfield in storage; decoded with `Permissions::from_decimal`.
    pub permissions: i64,
    pub is_admin: bool,
    pub security_level: i32,
    pub mentionable: bool,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 100, message = "role name must be 1-100 characters"))]
    pub name: String,
    pub color: Option<i32>,
    pub hoist: Option<bool>,
    pub mentionable: Option<bool>,
    pub permissions: Option<String>,
    pub is_admin: Option<bool>,
    pub security_level: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub color: Option<i32>,
    pub hoist: Option<bool>,
    pub mentionable: Option<bool>,
    pub permissions: Option<String>,
    pub is_admin: Option<bool>,
    pub security_level: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReorderRolesRequest {
    pub role_ids: Vec<Uuid>,
}
