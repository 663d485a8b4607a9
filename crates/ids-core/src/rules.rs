//! Declarative rule engine (C3) — runs before RBAC on secure channels. Rules
//! are a priority-ordered sequence of `{id, priority, applicable_actions, evaluate}`
//! records; the teacher's codebase has no analog for this (it has no secure-channel
//! concept at all), so the shape here is original to this core, built around the
//! closed tagged-decision pattern SPEC_FULL.md calls for in place of dynamic dispatch.

use ids_common::error::IdsError;
use ids_common::models::audit::AuditResult;
use ids_common::permissions::Permissions;
use ids_db::repository::channels;
use uuid::Uuid;

use crate::audit::AuditSink;
use crate::rate_limiter::RateLimiter;
use crate::resolver::{self, Resolved};

/// The action an actor is attempting — the wildcard and the six actions the
/// built-in rules name explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Any,
    SendMessage,
    DeleteMessage,
    OverrideSecurity,
    SetSecure,
    RemoveSecure,
    ViewLogs,
    TriggerLockdown,
    ReleaseLockdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
    Continue,
}

pub struct RuleOutcome {
    pub decision: Decision,
    pub reason: &'static str,
    pub audit: bool,
}

impl RuleOutcome {
    fn allow(reason: &'static str, audit: bool) -> Self {
        Self { decision: Decision::Allow, reason, audit }
    }
    fn deny(reason: &'static str, audit: bool) -> Self {
        Self { decision: Decision::Deny, reason, audit }
    }
    fn cont() -> Self {
        Self { decision: Decision::Continue, reason: "", audit: false }
    }
}

/// Request context passed into the rule engine and resolver together.
pub struct Context {
    pub principal: Uuid,
    pub server: Uuid,
    pub channel: Uuid,
    pub action: Action,
    pub is_own_message: bool,
}

/// Outcome of `evaluate_rules`/`check_access`, carrying whatever rule (if any)
/// already produced an audit so `check_access` does not double-write one.
pub struct AccessResult {
    pub allowed: bool,
    pub reason: &'static str,
    pub audited: bool,
}

struct RuleMatch {
    id: &'static str,
    allowed: bool,
    reason: &'static str,
    audit: bool,
}

/// §4.3's six built-in rules, in the priority order the section lists them.
/// `channel.lockdown` / `is_secure` / `security_level` are resolved once by
/// the caller and threaded through, since rule evaluation must stay pure and
/// non-suspending per §5.
fn run_rules(
    action: Action,
    is_secure: bool,
    lockdown: bool,
    security_level: i32,
    ctx: &Context,
    over_rate_limit: bool,
) -> Option<RuleMatch> {
    // 1. lockdown_block — priority 0, all actions.
    if lockdown {
        if security_level < 90 {
            return Some(RuleMatch {
                id: "lockdown_block",
                allowed: false,
                reason: "channel_is_locked_down",
                audit: true,
            });
        }
        return Some(RuleMatch {
            id: "lockdown_block",
            allowed: true,
            reason: "lockdown_bypass_co_owner+",
            audit: true,
        });
    }

    // 2. owner_override — priority 10, {override_security, set_secure, remove_secure}.
    if matches!(action, Action::OverrideSecurity | Action::SetSecure | Action::RemoveSecure) {
        return Some(if security_level >= 100 {
            RuleMatch { id: "owner_override", allowed: true, reason: "owner", audit: false }
        } else {
            RuleMatch {
                id: "owner_override",
                allowed: false,
                reason: "requires_owner",
                audit: true,
            }
        });
    }

    // 3. secure_view_logs — priority 10, view_logs.
    if action == Action::ViewLogs {
        return Some(if is_secure && security_level >= 70 {
            RuleMatch { id: "secure_view_logs", allowed: true, reason: "security_admin+", audit: false }
        } else {
            RuleMatch {
                id: "secure_view_logs",
                allowed: false,
                reason: "requires_security_admin",
                audit: true,
            }
        });
    }

    // 4. secure_trigger_lockdown — priority 10, {trigger_lockdown, release_lockdown}.
    if matches!(action, Action::TriggerLockdown | Action::ReleaseLockdown) {
        return Some(if is_secure && security_level >= 80 {
            RuleMatch { id: "secure_trigger_lockdown", allowed: true, reason: "admin+", audit: false }
        } else {
            RuleMatch {
                id: "secure_trigger_lockdown",
                allowed: false,
                reason: "requires_admin",
                audit: true,
            }
        });
    }

    // 5. block_unauthorized_delete — priority 20, delete_message.
    if action == Action::DeleteMessage && is_secure {
        if ctx.is_own_message || security_level >= 70 {
            // continue — no terminal decision from this rule.
        } else {
            return Some(RuleMatch {
                id: "block_unauthorized_delete",
                allowed: false,
                reason: "requires_moderator_or_own_message",
                audit: true,
            });
        }
    }

    // 6. secure_rate_limit — priority 50, send_message.
    if action == Action::SendMessage && is_secure && security_level < 70 && over_rate_limit {
        return Some(RuleMatch {
            id: "secure_rate_limit",
            allowed: false,
            reason: "secure_rate_limited",
            audit: true,
        });
    }

    None
}

/// §4.3's `evaluate_rules`. Loads the channel, computes the security level,
/// runs the applicable built-ins, and falls back to the default terminal
/// policy (secure → deny, non-secure → allow) if nothing matched.
pub async fn evaluate_rules(
    pool: &sqlx::AnyPool,
    rate_limiter: &RateLimiter,
    ctx: &Context,
) -> Result<RuleOutcome, IdsError> {
    let channel = channels::find_by_id(pool, ctx.channel)
        .await?
        .ok_or_else(|| IdsError::not_found("channel"))?;

    let security_level = resolver::resolve_security_level(pool, ctx.principal, ctx.server).await?;

    let over_rate_limit = if ctx.action == Action::SendMessage && channel.is_secure && security_level < 70 {
        rate_limiter.check(ctx.principal, ctx.channel).await
    } else {
        false
    };

    match run_rules(ctx.action, channel.is_secure, channel.lockdown, security_level, ctx, over_rate_limit) {
        Some(m) if m.allowed => Ok(RuleOutcome::allow(m.reason, m.audit)),
        Some(m) => Ok(RuleOutcome::deny(m.reason, m.audit)),
        None if channel.is_secure => Ok(RuleOutcome::deny("secure_channel_default_deny", false)),
        None => Ok(RuleOutcome::allow("no_rule_blocked", false)),
    }
}

/// §4.3's `check_access` — rule engine, then resolver, with at most one audit
/// write per call.
pub async fn check_access(
    pool: &sqlx::AnyPool,
    rate_limiter: &RateLimiter,
    audit: &AuditSink,
    ctx: &Context,
    permission_key: Permissions,
) -> Result<AccessResult, IdsError> {
    let rule_outcome = evaluate_rules(pool, rate_limiter, ctx).await?;

    if rule_outcome.audit {
        let result = if rule_outcome.decision == Decision::Allow {
            AuditResult::Allowed
        } else {
            AuditResult::Denied
        };
        audit
            .append_best_effort(
                ctx.server,
                Some(ctx.channel),
                ctx.principal,
                rule_outcome.reason,
                permission_key_name(permission_key),
                result,
                None,
            )
            .await;
    }

    if rule_outcome.decision == Decision::Deny {
        return Ok(AccessResult {
            allowed: false,
            reason: rule_outcome.reason,
            audited: rule_outcome.audit,
        });
    }

    let resolved: Resolved = resolver::resolve(pool, ctx.principal, ctx.server, Some(ctx.channel)).await?;
    let channel = channels::find_by_id(pool, ctx.channel)
        .await?
        .ok_or_else(|| IdsError::not_found("channel"))?;

    let needs_view = permission_key != Permissions::VIEW_CHANNEL;
    let has_permission = resolved.has(permission_key)
        && (!channel.is_secure || !needs_view || resolved.has(Permissions::VIEW_CHANNEL));

    if !has_permission {
        let mut already_audited = rule_outcome.audit;
        if channel.is_secure && !already_audited {
            audit
                .append_best_effort(
                    ctx.server,
                    Some(ctx.channel),
                    ctx.principal,
                    "permission_denied",
                    permission_key_name(permission_key),
                    AuditResult::Denied,
                    None,
                )
                .await;
            already_audited = true;
        }
        return Ok(AccessResult {
            allowed: false,
            reason: "missing_permission",
            audited: already_audited,
        });
    }

    let mut audited = rule_outcome.audit;
    if channel.is_secure && !audited {
        audit
            .append_best_effort(
                ctx.server,
                Some(ctx.channel),
                ctx.principal,
                "access_granted",
                permission_key_name(permission_key),
                AuditResult::Allowed,
                None,
            )
            .await;
        audited = true;
    }

    Ok(AccessResult { allowed: true, reason: "allowed", audited })
}

fn permission_key_name(permission: Permissions) -> &'static str {
    match permission {
        Permissions::VIEW_CHANNEL => "view_channel",
        Permissions::SEND_MESSAGES => "send_messages",
        Permissions::DELETE_MESSAGES => "delete_messages",
        Permissions::EDIT_MESSAGES => "edit_messages",
        Permissions::MANAGE_CHANNELS => "manage_channels",
        Permissions::MANAGE_ROLES => "manage_roles",
        Permissions::MANAGE_SERVER => "manage_server",
        Permissions::BAN_MEMBERS => "ban_members",
        Permissions::KICK_MEMBERS => "kick_members",
        Permissions::MENTION_EVERYONE => "mention_everyone",
        Permissions::ATTACH_FILES => "attach_files",
        Permissions::CREATE_INVITES => "create_invites",
        Permissions::ADMINISTRATOR => "administrator",
        Permissions::MANAGE_MESSAGES => "manage_messages",
        Permissions::EDIT_OWN_MESSAGES => "edit_own_messages",
        Permissions::VIEW_AUDIT_LOG => "view_audit_log",
        _ => "unknown_permission",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(action: Action, is_own: bool) -> Context {
        Context {
            principal: Uuid::new_v4(),
            server: Uuid::new_v4(),
            channel: Uuid::new_v4(),
            action,
            is_own_message: is_own,
        }
    }

    #[test]
    fn lockdown_denies_below_co_owner() {
        let c = ctx(Action::SendMessage, false);
        let m = run_rules(Action::SendMessage, true, true, 80, &c, false).unwrap();
        assert!(!m.allowed);
        assert_eq!(m.reason, "channel_is_locked_down");
    }

    #[test]
    fn lockdown_allows_co_owner_and_above() {
        let c = ctx(Action::SendMessage, false);
        let m = run_rules(Action::SendMessage, true, true, 90, &c, false).unwrap();
        assert!(m.allowed);
    }

    #[test]
    fn delete_own_message_is_not_blocked_by_rule_five() {
        let c = ctx(Action::DeleteMessage, true);
        let m = run_rules(Action::DeleteMessage, true, false, 0, &c, false);
        assert!(m.is_none());
    }

    #[test]
    fn delete_others_message_below_moderator_is_denied() {
        let c = ctx(Action::DeleteMessage, false);
        let m = run_rules(Action::DeleteMessage, true, false, 50, &c, false).unwrap();
        assert!(!m.allowed);
    }

    #[test]
    fn rate_limited_send_is_denied() {
        let c = ctx(Action::SendMessage, false);
        let m = run_rules(Action::SendMessage, true, false, 30, &c, true).unwrap();
        assert!(!m.allowed);
        assert_eq!(m.reason, "secure_rate_limited");
    }
}
