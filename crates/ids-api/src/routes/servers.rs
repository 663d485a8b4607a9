//! Server routes — create, join, leave, manage.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use ids_common::{
    error::{IdsError, IdsResult},
    models::channel::ChannelType,
    models::member::Member,
    models::server::{CreateServerRequest, Server, UpdateServerRequest},
    permissions::Permissions,
    snowflake,
    validation::validate_request,
};
use ids_db::repository::{channels, member_roles, members, roles, servers};
use std::sync::Arc;
use uuid::Uuid;

use crate::{middleware::AuthContext, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/servers", get(list_my_servers).post(create_server))
        .route(
            "/servers/{server_id}",
            get(get_server).patch(update_server).delete(delete_server),
        )
        .route("/servers/{server_id}/members", get(list_members))
        .route("/servers/{server_id}/leave", post(leave_server))
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

/// GET /api/v1/servers — servers the authenticated principal belongs to.
async fn list_my_servers(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> IdsResult<Json<Vec<Server>>> {
    let list = servers::list_user_servers(&state.db.pool, auth.principal_id).await?;
    Ok(Json(list))
}

/// POST /api/v1/servers — creates the server, its implicit `@everyone` role at
/// position 0 (§3), a default text channel, and the owner's membership.
async fn create_server(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateServerRequest>,
) -> IdsResult<Json<Server>> {
    validate_request(&body)?;

    let server_id = snowflake::generate_id();
    let is_public = body.is_public.unwrap_or(false);

    let server = servers::create_server(&state.db.pool, server_id, &body.name, auth.principal_id, is_public)
        .await?;

    roles::create_role(
        &state.db.pool,
        snowflake::generate_id(),
        server_id,
        "@everyone",
        None,
        Permissions::default_bits().bits(),
        false,
        0,
        0,
        true,
    )
    .await?;

    channels::create_channel(
        &state.db.pool,
        snowflake::generate_id(),
        server_id,
        ChannelType::Text,
        "general",
        Some("General discussion"),
        0,
    )
    .await?;

    members::add_member(&state.db.pool, auth.principal_id, server_id).await?;

    tracing::info!(server_id = %server_id, owner = %auth.principal_id, name = %body.name, "server created");

    Ok(Json(server))
}

async fn get_server(
    State(state): State<Arc<AppState>>,
    Path(server_id): Path<Uuid>,
) -> IdsResult<Json<Server>> {
    let server = servers::find_by_id(&state.db.pool, server_id)
        .await?
        .ok_or_else(|| IdsError::not_found("server"))?;
    Ok(Json(server))
}

async fn update_server(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(server_id): Path<Uuid>,
    Json(body): Json<UpdateServerRequest>,
) -> IdsResult<Json<Server>> {
    validate_request(&body)?;

    let server = servers::find_by_id(&state.db.pool, server_id)
        .await?
        .ok_or_else(|| IdsError::not_found("server"))?;

    if server.owner_id != auth.principal_id {
        return Err(IdsError::forbidden("requires_owner"));
    }

    let updated = servers::update_server(
        &state.db.pool,
        server_id,
        body.name.as_deref(),
        body.description.as_deref(),
        body.is_public,
    )
    .await?;

    Ok(Json(updated))
}

async fn delete_server(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(server_id): Path<Uuid>,
) -> IdsResult<Json<serde_json::Value>> {
    let server = servers::find_by_id(&state.db.pool, server_id)
        .await?
        .ok_or_else(|| IdsError::not_found("server"))?;

    if server.owner_id != auth.principal_id {
        return Err(IdsError::forbidden("requires_owner"));
    }

    servers::delete_server(&state.db.pool, server_id).await?;
    tracing::info!(server_id = %server_id, "server deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn list_members(
    State(state): State<Arc<AppState>>,
    Path(server_id): Path<Uuid>,
) -> IdsResult<Json<Vec<Member>>> {
    let list = members::list_members(&state.db.pool, server_id, 1000, 0).await?;
    Ok(Json(list))
}

/// POST /api/v1/servers/:server_id/leave — owner cannot leave; removes all
/// role assignments along with the membership.
async fn leave_server(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(server_id): Path<Uuid>,
) -> IdsResult<Json<serde_json::Value>> {
    let server = servers::find_by_id(&state.db.pool, server_id)
        .await?
        .ok_or_else(|| IdsError::not_found("server"))?;

    if server.owner_id == auth.principal_id {
        return Err(IdsError::bad_request(
            "server owner cannot leave; transfer ownership or delete the server",
        ));
    }

    member_roles::remove_all_for_member(&state.db.pool, server_id, auth.principal_id).await?;
    members::remove_member(&state.db.pool, auth.principal_id, server_id).await?;
    servers::decrement_member_count(&state.db.pool, server_id).await?;

    Ok(Json(serde_json::json!({ "left": true })))
}
