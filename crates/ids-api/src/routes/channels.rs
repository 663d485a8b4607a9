//! Channel routes — CRUD for channels within a server, gated by
//! `MANAGE_CHANNELS` via the permission resolver (C2).

use axum::{
    extract::{Extension, Path, State},
    middleware,
    routing::get,
    Json, Router,
};
use ids_common::{
    error::{IdsError, IdsResult},
    models::channel::{Channel, CreateChannelRequest, UpdateChannelRequest},
    permissions::Permissions,
    snowflake,
    validation::validate_request,
};
use ids_core::resolver;
use ids_db::repository::channels;
use std::sync::Arc;
use uuid::Uuid;

use crate::{middleware::AuthContext, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/servers/{server_id}/channels",
            get(list_channels).post(create_channel),
        )
        .route(
            "/servers/{server_id}/channels/{channel_id}",
            get(get_channel).patch(update_channel).delete(delete_channel),
        )
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

async fn require_manage_channels(
    pool: &sqlx::AnyPool,
    principal: Uuid,
    server_id: Uuid,
) -> IdsResult<()> {
    let resolved = resolver::resolve(pool, principal, server_id, None).await?;
    if !resolved.has(Permissions::MANAGE_CHANNELS) {
        return Err(IdsError::forbidden("manage_channels"));
    }
    Ok(())
}

async fn list_channels(
    State(state): State<Arc<AppState>>,
    Path(server_id): Path<Uuid>,
) -> IdsResult<Json<Vec<Channel>>> {
    let list = channels::list_server_channels(&state.db.pool, server_id).await?;
    Ok(Json(list))
}

async fn create_channel(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(server_id): Path<Uuid>,
    Json(body): Json<CreateChannelRequest>,
) -> IdsResult<Json<Channel>> {
    validate_request(&body)?;
    require_manage_channels(&state.db.pool, auth.principal_id, server_id).await?;

    let channel = channels::create_channel(
        &state.db.pool,
        snowflake::generate_id(),
        server_id,
        body.channel_type,
        &body.name,
        body.topic.as_deref(),
        body.position.unwrap_or(0),
    )
    .await?;

    tracing::info!(channel_id = %channel.id, server_id = %server_id, name = %body.name, "channel created");

    Ok(Json(channel))
}

async fn get_channel(
    State(state): State<Arc<AppState>>,
    Path((_, channel_id)): Path<(Uuid, Uuid)>,
) -> IdsResult<Json<Channel>> {
    let channel = channels::find_by_id(&state.db.pool, channel_id)
        .await?
        .ok_or_else(|| IdsError::not_found("channel"))?;
    Ok(Json(channel))
}

async fn update_channel(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, channel_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateChannelRequest>,
) -> IdsResult<Json<Channel>> {
    validate_request(&body)?;
    require_manage_channels(&state.db.pool, auth.principal_id, server_id).await?;

    channels::find_by_id(&state.db.pool, channel_id)
        .await?
        .ok_or_else(|| IdsError::not_found("channel"))?;

    let updated = channels::update_channel(
        &state.db.pool,
        channel_id,
        body.name.as_deref(),
        body.topic.as_deref(),
        body.position,
    )
    .await?;

    Ok(Json(updated))
}

/// DELETE — forbidden when `channel_id` is the server's last remaining channel (§3).
async fn delete_channel(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, channel_id)): Path<(Uuid, Uuid)>,
) -> IdsResult<Json<serde_json::Value>> {
    require_manage_channels(&state.db.pool, auth.principal_id, server_id).await?;

    channels::find_by_id(&state.db.pool, channel_id)
        .await?
        .ok_or_else(|| IdsError::not_found("channel"))?;

    if channels::count_server_channels(&state.db.pool, server_id).await? <= 1 {
        return Err(IdsError::bad_request("cannot delete the server's last channel"));
    }

    channels::delete_channel(&state.db.pool, channel_id).await?;
    tracing::info!(channel_id = %channel_id, "channel deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}
