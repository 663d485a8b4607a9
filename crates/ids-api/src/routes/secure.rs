//! Secure-channel control surface (§4.9/§6): secure toggle, lockdown, audit
//! log retrieval, and per-user channel overrides. Every mutation runs the
//! rule engine first, so the owner/admin gating in §4.3's `owner_override`
//! and `secure_trigger_lockdown` rules is the single source of truth — these
//! handlers never duplicate that check locally.

use axum::{
    extract::{Extension, Path, Query, State},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use ids_common::{
    error::{IdsError, IdsResult},
    events::{BusEvent, Topic},
    models::audit::{AuditLogQuery, SecureAuditEntry},
    models::channel::Channel,
    models::channel_override::SetUserOverrideRequest,
    permissions::Permissions,
    validation::validate_decimal_bitfield,
};
use ids_core::rules::{check_access, Action, Context};
use ids_db::repository::{channel_overrides, channels};
use std::sync::Arc;
use uuid::Uuid;

use crate::{middleware::AuthContext, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/servers/{server_id}/channels/{channel_id}/secure",
            post(set_secure).delete(remove_secure),
        )
        .route(
            "/servers/{server_id}/channels/{channel_id}/lockdown",
            post(trigger_lockdown).delete(release_lockdown),
        )
        .route(
            "/servers/{server_id}/channels/{channel_id}/secure/audit",
            get(list_audit),
        )
        .route(
            "/servers/{server_id}/channels/{channel_id}/user-overrides",
            get(list_user_overrides),
        )
        .route(
            "/servers/{server_id}/channels/{channel_id}/user-overrides/{user_id}",
            put(set_user_override).delete(remove_user_override),
        )
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

fn ctx(auth: &AuthContext, server_id: Uuid, channel_id: Uuid, action: Action) -> Context {
    Context {
        principal: auth.principal_id,
        server: server_id,
        channel: channel_id,
        action,
        is_own_message: false,
    }
}

async fn set_secure(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, channel_id)): Path<(Uuid, Uuid)>,
) -> IdsResult<Json<Channel>> {
    let access = check_access(
        &state.db.pool,
        &state.rate_limiter,
        &state.audit,
        &ctx(&auth, server_id, channel_id, Action::SetSecure),
        Permissions::MANAGE_SERVER,
    )
    .await?;
    if !access.allowed {
        return Err(IdsError::forbidden(access.reason));
    }

    let channel = channels::set_secure(&state.db.pool, channel_id, true).await?;

    state.bus.publish(BusEvent {
        topic: Topic::ChannelSecured,
        ts: Utc::now(),
        server_id,
        channel_id: Some(channel_id),
        origin_principal: Some(auth.principal_id),
        data: serde_json::json!({ "is_secure": true }),
    });

    Ok(Json(channel))
}

async fn remove_secure(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, channel_id)): Path<(Uuid, Uuid)>,
) -> IdsResult<Json<Channel>> {
    let access = check_access(
        &state.db.pool,
        &state.rate_limiter,
        &state.audit,
        &ctx(&auth, server_id, channel_id, Action::RemoveSecure),
        Permissions::MANAGE_SERVER,
    )
    .await?;
    if !access.allowed {
        return Err(IdsError::forbidden(access.reason));
    }

    let channel = channels::set_secure(&state.db.pool, channel_id, false).await?;

    state.bus.publish(BusEvent {
        topic: Topic::ChannelSecured,
        ts: Utc::now(),
        server_id,
        channel_id: Some(channel_id),
        origin_principal: Some(auth.principal_id),
        data: serde_json::json!({ "is_secure": false }),
    });

    Ok(Json(channel))
}

/// Engages lockdown and publishes `channel.lockdown` so `ids-gateway` can
/// force-unsubscribe every principal below security level 90 (§4.9).
async fn trigger_lockdown(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, channel_id)): Path<(Uuid, Uuid)>,
) -> IdsResult<Json<Channel>> {
    let access = check_access(
        &state.db.pool,
        &state.rate_limiter,
        &state.audit,
        &ctx(&auth, server_id, channel_id, Action::TriggerLockdown),
        Permissions::MANAGE_SERVER,
    )
    .await?;
    if !access.allowed {
        return Err(IdsError::forbidden(access.reason));
    }

    let channel = channels::set_lockdown(&state.db.pool, channel_id, true).await?;

    state.bus.publish(BusEvent {
        topic: Topic::ChannelLockdown,
        ts: Utc::now(),
        server_id,
        channel_id: Some(channel_id),
        origin_principal: Some(auth.principal_id),
        data: serde_json::json!({ "lockdown": true, "bypass_security_level": 90 }),
    });

    Ok(Json(channel))
}

async fn release_lockdown(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, channel_id)): Path<(Uuid, Uuid)>,
) -> IdsResult<Json<Channel>> {
    let access = check_access(
        &state.db.pool,
        &state.rate_limiter,
        &state.audit,
        &ctx(&auth, server_id, channel_id, Action::ReleaseLockdown),
        Permissions::MANAGE_SERVER,
    )
    .await?;
    if !access.allowed {
        return Err(IdsError::forbidden(access.reason));
    }

    let channel = channels::set_lockdown(&state.db.pool, channel_id, false).await?;

    state.bus.publish(BusEvent {
        topic: Topic::ChannelLockdown,
        ts: Utc::now(),
        server_id,
        channel_id: Some(channel_id),
        origin_principal: Some(auth.principal_id),
        data: serde_json::json!({ "lockdown": false }),
    });

    Ok(Json(channel))
}

async fn list_audit(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, channel_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<AuditLogQuery>,
) -> IdsResult<Json<Vec<SecureAuditEntry>>> {
    let access = check_access(
        &state.db.pool,
        &state.rate_limiter,
        &state.audit,
        &ctx(&auth, server_id, channel_id, Action::ViewLogs),
        Permissions::VIEW_AUDIT_LOG,
    )
    .await?;
    if !access.allowed {
        return Err(IdsError::forbidden(access.reason));
    }

    let entries = state.audit.list(server_id, Some(channel_id), &query).await?;
    Ok(Json(entries))
}

async fn list_user_overrides(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, channel_id)): Path<(Uuid, Uuid)>,
) -> IdsResult<Json<Vec<ids_common::models::channel_override::ChannelUserOverride>>> {
    let access = check_access(
        &state.db.pool,
        &state.rate_limiter,
        &state.audit,
        &ctx(&auth, server_id, channel_id, Action::OverrideSecurity),
        Permissions::MANAGE_SERVER,
    )
    .await?;
    if !access.allowed {
        return Err(IdsError::forbidden(access.reason));
    }

    let list = channel_overrides::list_user_overrides(&state.db.pool, channel_id).await?;
    Ok(Json(list))
}

async fn set_user_override(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, channel_id, user_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(body): Json<SetUserOverrideRequest>,
) -> IdsResult<Json<ids_common::models::channel_override::ChannelUserOverride>> {
    let access = check_access(
        &state.db.pool,
        &state.rate_limiter,
        &state.audit,
        &ctx(&auth, server_id, channel_id, Action::OverrideSecurity),
        Permissions::MANAGE_SERVER,
    )
    .await?;
    if !access.allowed {
        return Err(IdsError::forbidden(access.reason));
    }

    let allow = validate_decimal_bitfield(&body.allow_permissions)?;
    let deny = validate_decimal_bitfield(&body.deny_permissions)?;

    let over = channel_overrides::set_user_override(&state.db.pool, channel_id, user_id, allow, deny).await?;
    Ok(Json(over))
}

async fn remove_user_override(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, channel_id, user_id)): Path<(Uuid, Uuid, Uuid)>,
) -> IdsResult<Json<serde_json::Value>> {
    let access = check_access(
        &state.db.pool,
        &state.rate_limiter,
        &state.audit,
        &ctx(&auth, server_id, channel_id, Action::OverrideSecurity),
        Permissions::MANAGE_SERVER,
    )
    .await?;
    if !access.allowed {
        return Err(IdsError::forbidden(access.reason));
    }

    channel_overrides::remove_user_override(&state.db.pool, channel_id, user_id).await?;
    Ok(Json(serde_json::json!({ "removed": true })))
}
