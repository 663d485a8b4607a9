//! Role repository (§3). `delete_role`'s `AND is_default = false` guard is the
//! storage-level half of "the `@everyone` role... cannot be deleted" — the
//! position-0/rename guard is enforced in `ids-api` where the request body is
//! available to reject a rename attempt before it reaches here.

use ids_common::models::role::Role;
use uuid::Uuid;

pub async fn create_role(
    pool: &sqlx::AnyPool,
    id: Uuid,
    server_id: Uuid,
    name: &str,
    color: Option<i32>,
    permissions: i64,
    is_admin: bool,
    security_level: i32,
    position: i32,
    is_default: bool,
) -> Result<Role, sqlx::Error> {
    sqlx::query_as::<_, Role>(
        r#"
        INSERT INTO roles (
            id, server_id, name, color, hoist, position, permissions, is_admin,
            security_level, mentionable, is_default, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, false, ?, ?, ?, ?, true, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(server_id.to_string())
    .bind(name)
    .bind(color)
    .bind(position)
    .bind(permissions)
    .bind(is_admin)
    .bind(security_level)
    .bind(is_default)
    .fetch_one(pool)
    .await
}

pub async fn list_server_roles(
    pool: &sqlx::AnyPool,
    server_id: Uuid,
) -> Result<Vec<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE server_id = ? ORDER BY position DESC")
        .bind(server_id.to_string())
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &sqlx::AnyPool, id: Uuid) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

#[allow(clippy::too_many_arguments)]
pub async fn update_role(
    pool: &sqlx::AnyPool,
    id: Uuid,
    name: Option<&str>,
    color: Option<i32>,
    permissions: Option<i64>,
    is_admin: Option<bool>,
    security_level: Option<i32>,
    hoist: Option<bool>,
    mentionable: Option<bool>,
) -> Result<Role, sqlx::Error> {
    sqlx::query_as::<_, Role>(
        r#"
        UPDATE roles SET
            name = COALESCE(?, name),
            color = COALESCE(?, color),
            permissions = COALESCE(?, permissions),
            is_admin = COALESCE(?, is_admin),
            security_level = COALESCE(?, security_level),
            hoist = COALESCE(?, hoist),
            mentionable = COALESCE(?, mentionable),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(color)
    .bind(permissions)
    .bind(is_admin)
    .bind(security_level)
    .bind(hoist)
    .bind(mentionable)
    .bind(id.to_string())
    .fetch_one(pool)
    .await
}

pub async fn update_position(
    pool: &sqlx::AnyPool,
    id: Uuid,
    position: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE roles SET position = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(position)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_role(pool: &sqlx::AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM roles WHERE id = ? AND is_default = false")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get_everyone_role(
    pool: &sqlx::AnyPool,
    server_id: Uuid,
) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE server_id = ? AND is_default = true")
        .bind(server_id.to_string())
        .fetch_optional(pool)
        .await
}
