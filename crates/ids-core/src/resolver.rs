//! Permission resolver (C2) — two pure, stateless functions that fold owner
//! status, role membership, and channel overrides into a final bitfield and
//! security level. Every permission-sensitive call site, REST or socket,
//! funnels through these two functions rather than re-deriving access.

use ids_common::error::IdsError;
use ids_common::permissions::Permissions;
use ids_db::repository::{channel_overrides, member_roles, roles, servers};
use uuid::Uuid;

/// Outcome of `resolve` — never carries a "not found" variant itself; callers
/// get that as an `Err(IdsError::NotFound)` instead, since every caller needs
/// to propagate it as a request failure anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub permissions: i64,
    pub is_owner: bool,
    pub is_admin: bool,
}

impl Resolved {
    fn owner() -> Self {
        Self {
            permissions: Permissions::all().bits(),
            is_owner: true,
            is_admin: true,
        }
    }

    fn admin(permissions: i64) -> Self {
        let _ = permissions;
        Self {
            permissions: Permissions::all().bits(),
            is_owner: false,
            is_admin: true,
        }
    }

    fn plain(permissions: i64) -> Self {
        Self {
            permissions,
            is_owner: false,
            is_admin: false,
        }
    }

    pub fn has(&self, bit: Permissions) -> bool {
        self.is_admin || Permissions::from_bits_truncate(self.permissions).contains(bit)
    }
}

/// §4.2 step 1-8. `channel` is `None` for server-scoped checks.
pub async fn resolve(
    pool: &sqlx::AnyPool,
    principal: Uuid,
    server: Uuid,
    channel: Option<Uuid>,
) -> Result<Resolved, IdsError> {
    let server_row = servers::find_by_id(pool, server)
        .await?
        .ok_or_else(|| IdsError::not_found("server"))?;

    if server_row.owner_id == principal {
        return Ok(Resolved::owner());
    }

    let everyone = roles::get_everyone_role(pool, server).await?;
    let mut role_ids = member_roles::list_role_ids_for_member(pool, server, principal).await?;
    if let Some(ref everyone) = everyone {
        if !role_ids.contains(&everyone.id) {
            role_ids.push(everyone.id);
        }
    }
    if role_ids.is_empty() {
        return Ok(Resolved::plain(0));
    }

    let all_roles = roles::list_server_roles(pool, server).await?;
    let assigned_roles: Vec<_> = all_roles
        .into_iter()
        .filter(|r| role_ids.contains(&r.id))
        .collect();

    let mut base: i64 = 0;
    let mut any_admin = false;
    for role in &assigned_roles {
        base |= role.permissions;
        any_admin |= role.is_admin;
    }
    let base_bits = Permissions::from_bits_truncate(base);
    if any_admin || base_bits.is_admin() {
        return Ok(Resolved::admin(base));
    }

    let Some(channel_id) = channel else {
        return Ok(Resolved::plain(base));
    };

    let role_overrides = channel_overrides::list_role_overrides(pool, channel_id).await?;
    let mut allow_union: i64 = 0;
    let mut deny_union: i64 = 0;
    for ov in role_overrides.iter().filter(|o| role_ids.contains(&o.role_id)) {
        allow_union |= ov.allow;
        deny_union |= ov.deny;
    }
    let mut effective = (base | allow_union) & !deny_union;

    if let Some(user_ov) = channel_overrides::get_user_override(pool, channel_id, principal).await? {
        effective = (effective | user_ov.allow) & !user_ov.deny;
    }

    Ok(Resolved::plain(effective))
}

/// §4.2's second pure function — the security-level ladder used by the rule
/// engine and hierarchy checks, independent of the bitfield above.
pub async fn resolve_security_level(
    pool: &sqlx::AnyPool,
    principal: Uuid,
    server: Uuid,
) -> Result<i32, IdsError> {
    let server_row = servers::find_by_id(pool, server)
        .await?
        .ok_or_else(|| IdsError::not_found("server"))?;

    if server_row.owner_id == principal {
        return Ok(100);
    }

    let everyone = roles::get_everyone_role(pool, server).await?;
    let mut role_ids = member_roles::list_role_ids_for_member(pool, server, principal).await?;
    if let Some(ref everyone) = everyone {
        if !role_ids.contains(&everyone.id) {
            role_ids.push(everyone.id);
        }
    }
    if role_ids.is_empty() {
        return Ok(0);
    }

    let all_roles = roles::list_server_roles(pool, server).await?;
    let mut max_level = 0;
    let mut any_admin = false;
    for role in all_roles.into_iter().filter(|r| role_ids.contains(&r.id)) {
        max_level = max_level.max(role.security_level);
        any_admin |= role.is_admin;
    }
    if any_admin && max_level < 80 {
        max_level = 80;
    }
    Ok(max_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_admin_has_reports_true_for_any_bit() {
        let r = Resolved::admin(0);
        assert!(r.has(Permissions::BAN_MEMBERS));
        assert!(r.is_admin);
    }

    #[test]
    fn resolved_plain_only_has_granted_bits() {
        let r = Resolved::plain(Permissions::VIEW_CHANNEL.bits() as i64);
        assert!(r.has(Permissions::VIEW_CHANNEL));
        assert!(!r.has(Permissions::BAN_MEMBERS));
    }

    #[test]
    fn resolved_owner_is_owner_and_admin_with_all_bits() {
        let r = Resolved::owner();
        assert!(r.is_owner);
        assert!(r.is_admin);
        assert!(r.has(Permissions::ADMINISTRATOR));
    }
}
