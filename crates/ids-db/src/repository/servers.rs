//! Server repository — CRUD for the Server entity (§3).

use ids_common::models::server::Server;
use uuid::Uuid;

pub async fn create_server(
    pool: &sqlx::AnyPool,
    id: Uuid,
    name: &str,
    owner_id: Uuid,
    is_public: bool,
) -> Result<Server, sqlx::Error> {
    sqlx::query_as::<_, Server>(
        r#"
        INSERT INTO servers (id, name, owner_id, is_public, member_count, created_at, updated_at)
        VALUES (?, ?, ?, ?, 1, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(name)
    .bind(owner_id.to_string())
    .bind(is_public)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &sqlx::AnyPool, id: Uuid) -> Result<Option<Server>, sqlx::Error> {
    sqlx::query_as::<_, Server>("SELECT * FROM servers WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

pub async fn list_user_servers(
    pool: &sqlx::AnyPool,
    user_id: Uuid,
) -> Result<Vec<Server>, sqlx::Error> {
    sqlx::query_as::<_, Server>(
        r#"
        SELECT s.* FROM servers s
        INNER JOIN members m ON m.server_id = s.id
        WHERE m.user_id = ?
        ORDER BY s.name
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await
}

pub async fn update_server(
    pool: &sqlx::AnyPool,
    id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
    is_public: Option<bool>,
) -> Result<Server, sqlx::Error> {
    sqlx::query_as::<_, Server>(
        r#"
        UPDATE servers SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            is_public = COALESCE(?, is_public),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(description)
    .bind(is_public)
    .bind(id.to_string())
    .fetch_one(pool)
    .await
}

/// Cascading deletes (channels, roles, members, overrides, audit) are handled by
/// foreign keys in the migration schema.
pub async fn delete_server(pool: &sqlx::AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM servers WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn increment_member_count(pool: &sqlx::AnyPool, server_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE servers SET member_count = member_count + 1 WHERE id = ?")
        .bind(server_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn decrement_member_count(pool: &sqlx::AnyPool, server_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE servers SET member_count = max(member_count - 1, 0) WHERE id = ?")
        .bind(server_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
