//! Voice membership REST routes (§4.8). The WebSocket in `ids-voice` carries
//! SDP/ICE signaling and heartbeats during an active session; these endpoints
//! cover pre-flight join/leave, state patches, and stage hand-raising that
//! don't need a live socket round-trip.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    routing::{patch, post},
    Json, Router,
};
use chrono::Utc;
use ids_common::{
    error::{IdsError, IdsResult},
    events::{BusEvent, Topic},
    models::channel::ChannelType,
    models::voice_membership::{VoiceMembership, VoiceStateUpdateRequest},
    permissions::Permissions,
};
use ids_core::resolver;
use ids_db::repository::{channels, voice_memberships};
use std::sync::Arc;
use uuid::Uuid;

use crate::{middleware::AuthContext, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/voice/{server_id}/{channel_id}/join", post(join))
        .route("/voice/{server_id}/{channel_id}/leave", post(leave))
        .route("/voice/{server_id}/{channel_id}/heartbeat", post(heartbeat))
        .route("/voice/{server_id}/{channel_id}/state", patch(update_state))
        .route(
            "/voice/{server_id}/{channel_id}/stage/request",
            post(stage_request),
        )
        .route(
            "/voice/{server_id}/{channel_id}/stage/promote/{user_id}",
            post(stage_promote),
        )
        .route(
            "/voice/{server_id}/{channel_id}/stage/demote/{user_id}",
            post(stage_demote),
        )
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

async fn join(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, channel_id)): Path<(Uuid, Uuid)>,
) -> IdsResult<Json<VoiceMembership>> {
    let channel = channels::find_by_id(&state.db.pool, channel_id)
        .await?
        .ok_or_else(|| IdsError::not_found("channel"))?;

    if !matches!(channel.channel_type, ChannelType::Voice | ChannelType::Stage) {
        return Err(IdsError::bad_request("channel is not a voice channel"));
    }

    let resolved = resolver::resolve(&state.db.pool, auth.principal_id, server_id, Some(channel_id)).await?;
    if !resolved.has(Permissions::VIEW_CHANNEL) {
        return Err(IdsError::forbidden("view_channel"));
    }

    let prior = voice_memberships::find_by_user(&state.db.pool, auth.principal_id).await?;

    let membership = voice_memberships::join(&state.db.pool, server_id, channel_id, auth.principal_id).await?;

    if let Some(prior) = prior {
        if prior.channel_id != channel_id {
            state.bus.publish(BusEvent {
                topic: Topic::VoiceLeave,
                ts: Utc::now(),
                server_id: prior.server_id,
                channel_id: Some(prior.channel_id),
                origin_principal: Some(auth.principal_id),
                data: serde_json::json!({ "user_id": auth.principal_id }),
            });
        }
    }

    state.bus.publish(BusEvent {
        topic: Topic::VoiceJoin,
        ts: Utc::now(),
        server_id,
        channel_id: Some(channel_id),
        origin_principal: Some(auth.principal_id),
        data: serde_json::json!({ "user_id": auth.principal_id }),
    });

    Ok(Json(membership))
}

async fn leave(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((_server_id, channel_id)): Path<(Uuid, Uuid)>,
) -> IdsResult<Json<serde_json::Value>> {
    let membership = voice_memberships::find_by_user(&state.db.pool, auth.principal_id)
        .await?
        .ok_or_else(|| IdsError::bad_request("not in a voice channel"))?;
    if membership.channel_id != channel_id {
        return Err(IdsError::bad_request("not in the specified voice channel"));
    }

    voice_memberships::leave(&state.db.pool, auth.principal_id).await?;
    Ok(Json(serde_json::json!({ "left": true })))
}

async fn heartbeat(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((_server_id, _channel_id)): Path<(Uuid, Uuid)>,
) -> IdsResult<Json<serde_json::Value>> {
    voice_memberships::touch_heartbeat(&state.db.pool, auth.principal_id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn update_state(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((_server_id, _channel_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<VoiceStateUpdateRequest>,
) -> IdsResult<Json<VoiceMembership>> {
    let updated = voice_memberships::update_state(
        &state.db.pool,
        auth.principal_id,
        body.muted,
        body.deafened,
        body.camera_on,
    )
    .await?;
    Ok(Json(updated))
}

/// A stage participant raises their hand; a moderator promotes/demotes via
/// the two endpoints below.
async fn stage_request(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((_server_id, _channel_id)): Path<(Uuid, Uuid)>,
) -> IdsResult<Json<serde_json::Value>> {
    voice_memberships::set_stage_requesting(&state.db.pool, auth.principal_id, true).await?;
    Ok(Json(serde_json::json!({ "requested": true })))
}

async fn stage_promote(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, _channel_id, user_id)): Path<(Uuid, Uuid, Uuid)>,
) -> IdsResult<Json<serde_json::Value>> {
    let resolved = resolver::resolve(&state.db.pool, auth.principal_id, server_id, None).await?;
    if !resolved.has(Permissions::MANAGE_CHANNELS) {
        return Err(IdsError::forbidden("manage_channels"));
    }

    voice_memberships::set_stage_speaker(&state.db.pool, user_id, true).await?;
    Ok(Json(serde_json::json!({ "promoted": true })))
}

async fn stage_demote(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, _channel_id, user_id)): Path<(Uuid, Uuid, Uuid)>,
) -> IdsResult<Json<serde_json::Value>> {
    let resolved = resolver::resolve(&state.db.pool, auth.principal_id, server_id, None).await?;
    if !resolved.has(Permissions::MANAGE_CHANNELS) {
        return Err(IdsError::forbidden("manage_channels"));
    }

    voice_memberships::set_stage_speaker(&state.db.pool, user_id, false).await?;
    Ok(Json(serde_json::json!({ "demoted": true })))
}
