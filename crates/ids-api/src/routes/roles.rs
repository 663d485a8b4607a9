//! Role CRUD, reordering, and member assignment (§3, §6), hierarchy-gated via
//! `ids_core::hierarchy`.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    routing::{get, put},
    Json, Router,
};
use ids_common::{
    error::{IdsError, IdsResult},
    models::role::{CreateRoleRequest, ReorderRolesRequest, Role, UpdateRoleRequest},
    permissions::Permissions,
    snowflake,
    validation::{validate_decimal_bitfield, validate_request},
};
use ids_core::{hierarchy, resolver};
use ids_db::repository::{member_roles, roles, servers};
use std::sync::Arc;
use uuid::Uuid;

use crate::{middleware::AuthContext, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/servers/{server_id}/roles", get(list_roles).post(create_role))
        .route(
            "/servers/{server_id}/roles/{role_id}",
            axum::routing::patch(update_role).delete(delete_role),
        )
        .route("/servers/{server_id}/roles/reorder", put(reorder_roles))
        .route(
            "/servers/{server_id}/members/{user_id}/roles/{role_id}",
            axum::routing::post(assign_role).delete(remove_role),
        )
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

async fn require_manage_roles(
    pool: &sqlx::AnyPool,
    principal: Uuid,
    server_id: Uuid,
) -> IdsResult<()> {
    let resolved = resolver::resolve(pool, principal, server_id, None).await?;
    if !resolved.has(Permissions::MANAGE_ROLES) {
        return Err(IdsError::forbidden("manage_roles"));
    }
    Ok(())
}

/// Creating or promoting a role to `is_admin=true` requires the server owner —
/// MANAGE_ROLES alone is not enough, since an admin role already carries
/// MANAGE_ROLES and would otherwise be able to mint its own replacement.
async fn require_owner(pool: &sqlx::AnyPool, principal: Uuid, server_id: Uuid) -> IdsResult<()> {
    let server = servers::find_by_id(pool, server_id)
        .await?
        .ok_or_else(|| IdsError::not_found("server"))?;
    if server.owner_id != principal {
        return Err(IdsError::forbidden("requires_owner"));
    }
    Ok(())
}

async fn list_roles(
    State(state): State<Arc<AppState>>,
    Path(server_id): Path<Uuid>,
) -> IdsResult<Json<Vec<Role>>> {
    let list = roles::list_server_roles(&state.db.pool, server_id).await?;
    Ok(Json(list))
}

async fn create_role(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(server_id): Path<Uuid>,
    Json(body): Json<CreateRoleRequest>,
) -> IdsResult<Json<Role>> {
    validate_request(&body)?;
    require_manage_roles(&state.db.pool, auth.principal_id, server_id).await?;
    if body.is_admin == Some(true) {
        require_owner(&state.db.pool, auth.principal_id, server_id).await?;
    }

    let permissions = match &body.permissions {
        Some(s) => validate_decimal_bitfield(s)?,
        None => 0,
    };

    let role = roles::create_role(
        &state.db.pool,
        snowflake::generate_id(),
        server_id,
        &body.name,
        body.color,
        permissions,
        body.is_admin.unwrap_or(false),
        body.security_level.unwrap_or(0),
        1,
        false,
    )
    .await?;

    tracing::info!(role_id = %role.id, server_id = %server_id, "role created");

    Ok(Json(role))
}

/// PATCH — position-0 (`@everyone`) cannot be renamed, matching the storage-level
/// guard in `delete_role` that already forbids deleting it.
async fn update_role(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, role_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateRoleRequest>,
) -> IdsResult<Json<Role>> {
    validate_request(&body)?;
    require_manage_roles(&state.db.pool, auth.principal_id, server_id).await?;

    let existing = roles::find_by_id(&state.db.pool, role_id)
        .await?
        .ok_or_else(|| IdsError::not_found("role"))?;

    if existing.is_default && body.name.is_some() {
        return Err(IdsError::bad_request("the @everyone role cannot be renamed"));
    }

    hierarchy::require_role_hierarchy(&state.db.pool, server_id, auth.principal_id, existing.position)
        .await?;
    if body.is_admin == Some(true) {
        require_owner(&state.db.pool, auth.principal_id, server_id).await?;
    }

    let permissions = match &body.permissions {
        Some(s) => Some(validate_decimal_bitfield(s)?),
        None => None,
    };

    let updated = roles::update_role(
        &state.db.pool,
        role_id,
        body.name.as_deref(),
        body.color,
        permissions,
        body.is_admin,
        body.security_level,
        body.hoist,
        body.mentionable,
    )
    .await?;

    Ok(Json(updated))
}

async fn delete_role(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, role_id)): Path<(Uuid, Uuid)>,
) -> IdsResult<Json<serde_json::Value>> {
    require_manage_roles(&state.db.pool, auth.principal_id, server_id).await?;

    let existing = roles::find_by_id(&state.db.pool, role_id)
        .await?
        .ok_or_else(|| IdsError::not_found("role"))?;

    if existing.is_default {
        return Err(IdsError::bad_request("the @everyone role cannot be deleted"));
    }

    hierarchy::require_role_hierarchy(&state.db.pool, server_id, auth.principal_id, existing.position)
        .await?;

    roles::delete_role(&state.db.pool, role_id).await?;

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// PUT — reassigns positions 1..N in submission order; the `@everyone` role at
/// position 0 is never part of this list and is left untouched.
async fn reorder_roles(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(server_id): Path<Uuid>,
    Json(body): Json<ReorderRolesRequest>,
) -> IdsResult<Json<serde_json::Value>> {
    validate_request(&body)?;
    require_manage_roles(&state.db.pool, auth.principal_id, server_id).await?;

    let actor_ceiling = hierarchy::highest_role_position(&state.db.pool, server_id, auth.principal_id).await?;

    for (idx, role_id) in body.role_ids.iter().enumerate() {
        let role = roles::find_by_id(&state.db.pool, *role_id)
            .await?
            .ok_or_else(|| IdsError::not_found("role"))?;
        if role.is_default {
            continue;
        }
        if actor_ceiling <= role.position as i64 {
            return Err(IdsError::forbidden("insufficient_role_hierarchy"));
        }
        roles::update_position(&state.db.pool, *role_id, (idx + 1) as i32).await?;
    }

    Ok(Json(serde_json::json!({ "reordered": true })))
}

async fn assign_role(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, user_id, role_id)): Path<(Uuid, Uuid, Uuid)>,
) -> IdsResult<Json<serde_json::Value>> {
    require_manage_roles(&state.db.pool, auth.principal_id, server_id).await?;

    let role = roles::find_by_id(&state.db.pool, role_id)
        .await?
        .ok_or_else(|| IdsError::not_found("role"))?;
    hierarchy::require_role_hierarchy(&state.db.pool, server_id, auth.principal_id, role.position).await?;

    if member_roles::has_role(&state.db.pool, server_id, user_id, role_id).await? {
        return Err(IdsError::Conflict { resource: "role assignment".to_string() });
    }

    member_roles::assign_role(&state.db.pool, server_id, user_id, role_id).await?;

    Ok(Json(serde_json::json!({ "assigned": true })))
}

async fn remove_role(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((server_id, user_id, role_id)): Path<(Uuid, Uuid, Uuid)>,
) -> IdsResult<Json<serde_json::Value>> {
    require_manage_roles(&state.db.pool, auth.principal_id, server_id).await?;

    let role = roles::find_by_id(&state.db.pool, role_id)
        .await?
        .ok_or_else(|| IdsError::not_found("role"))?;
    hierarchy::require_role_hierarchy(&state.db.pool, server_id, auth.principal_id, role.position).await?;

    member_roles::remove_role(&state.db.pool, server_id, user_id, role_id).await?;

    Ok(Json(serde_json::json!({ "removed": true })))
}
