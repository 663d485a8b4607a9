//! Member-role assignment — replaces the teacher's `roles UUID[]` column with
//! a first-class join table (§3's `MemberRole`).

use ids_common::models::member_role::MemberRole;
use uuid::Uuid;

/// Assign a role to a member. Fails with a unique-constraint violation (surfaced
/// by the caller as a conflict) if the role is already assigned.
pub async fn assign_role(
    pool: &sqlx::AnyPool,
    server_id: Uuid,
    user_id: Uuid,
    role_id: Uuid,
) -> Result<MemberRole, sqlx::Error> {
    sqlx::query_as::<_, MemberRole>(
        r#"
        INSERT INTO member_roles (server_id, user_id, role_id, assigned_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(server_id.to_string())
    .bind(user_id.to_string())
    .bind(role_id.to_string())
    .fetch_one(pool)
    .await
}

pub async fn remove_role(
    pool: &sqlx::AnyPool,
    server_id: Uuid,
    user_id: Uuid,
    role_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM member_roles WHERE server_id = ? AND user_id = ? AND role_id = ?")
        .bind(server_id.to_string())
        .bind(user_id.to_string())
        .bind(role_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn has_role(
    pool: &sqlx::AnyPool,
    server_id: Uuid,
    user_id: Uuid,
    role_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM member_roles WHERE server_id = ? AND user_id = ? AND role_id = ?)",
    )
    .bind(server_id.to_string())
    .bind(user_id.to_string())
    .bind(role_id.to_string())
    .fetch_one(pool)
    .await?;
    Ok(result.0)
}

/// Role IDs assigned directly to a member (the `@everyone` default role is not
/// stored here — it is implicit for every member of the server).
pub async fn list_role_ids_for_member(
    pool: &sqlx::AnyPool,
    server_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT role_id FROM member_roles WHERE server_id = ? AND user_id = ?",
    )
    .bind(server_id.to_string())
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(s,)| Uuid::parse_str(&s).ok())
        .collect())
}

pub async fn list_members_with_role(
    pool: &sqlx::AnyPool,
    role_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT user_id FROM member_roles WHERE role_id = ?")
            .bind(role_id.to_string())
            .fetch_all(pool)
            .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(s,)| Uuid::parse_str(&s).ok())
        .collect())
}

/// Remove every role assignment a member holds in a server (on member removal).
pub async fn remove_all_for_member(
    pool: &sqlx::AnyPool,
    server_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM member_roles WHERE server_id = ? AND user_id = ?")
        .bind(server_id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
