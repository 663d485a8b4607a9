//! Role-position hierarchy enforcement (§4.9). Grounded on the
//! `get_highest_role_position`/`require_hierarchy` pattern: the owner outranks
//! everyone (`i64::MAX`), a member with no assigned roles sits at position 0
//! (the `@everyone` floor), and any mutation targeting a role or member must
//! originate strictly above the target's highest position.

use ids_common::error::IdsError;
use ids_db::repository::{member_roles, roles, servers};
use uuid::Uuid;

/// The actor's highest role position in `server`. Owner is unbounded.
pub async fn highest_role_position(
    pool: &sqlx::AnyPool,
    server: Uuid,
    principal: Uuid,
) -> Result<i64, IdsError> {
    let server_row = servers::find_by_id(pool, server)
        .await?
        .ok_or_else(|| IdsError::not_found("server"))?;
    if server_row.owner_id == principal {
        return Ok(i64::MAX);
    }

    let role_ids = member_roles::list_role_ids_for_member(pool, server, principal).await?;
    if role_ids.is_empty() {
        return Ok(0);
    }

    let all_roles = roles::list_server_roles(pool, server).await?;
    Ok(all_roles
        .into_iter()
        .filter(|r| role_ids.contains(&r.id))
        .map(|r| r.position as i64)
        .max()
        .unwrap_or(0))
}

/// §8's hierarchy invariant: an actor may only mutate a role strictly below
/// their own ceiling. Owner bypasses via the unbounded position above.
pub async fn require_role_hierarchy(
    pool: &sqlx::AnyPool,
    server: Uuid,
    actor: Uuid,
    role_position: i32,
) -> Result<(), IdsError> {
    let actor_pos = highest_role_position(pool, server, actor).await?;
    if actor_pos <= role_position as i64 {
        return Err(IdsError::forbidden("insufficient_role_hierarchy"));
    }
    Ok(())
}

/// Same check against another member, used for kick/ban-style actions.
pub async fn require_member_hierarchy(
    pool: &sqlx::AnyPool,
    server: Uuid,
    actor: Uuid,
    target: Uuid,
) -> Result<(), IdsError> {
    let actor_pos = highest_role_position(pool, server, actor).await?;
    let target_pos = highest_role_position(pool, server, target).await?;
    if actor_pos <= target_pos {
        return Err(IdsError::forbidden("insufficient_role_hierarchy"));
    }
    Ok(())
}
