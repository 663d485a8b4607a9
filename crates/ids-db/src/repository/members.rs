//! Member repository — server membership management. Role assignment lives in
//! `member_roles` now that roles are a join table rather than a `UUID[]` column.

use ids_common::models::member::Member;
use uuid::Uuid;

pub async fn add_member(
    pool: &sqlx::AnyPool,
    user_id: Uuid,
    server_id: Uuid,
) -> Result<Member, sqlx::Error> {
    sqlx::query_as::<_, Member>(
        r#"
        INSERT INTO members (user_id, server_id, nickname, joined_at)
        VALUES (?, ?, NULL, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(user_id.to_string())
    .bind(server_id.to_string())
    .fetch_one(pool)
    .await
}

pub async fn remove_member(
    pool: &sqlx::AnyPool,
    user_id: Uuid,
    server_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM members WHERE user_id = ? AND server_id = ?")
        .bind(user_id.to_string())
        .bind(server_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_member(
    pool: &sqlx::AnyPool,
    user_id: Uuid,
    server_id: Uuid,
) -> Result<Option<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>("SELECT * FROM members WHERE user_id = ? AND server_id = ?")
        .bind(user_id.to_string())
        .bind(server_id.to_string())
        .fetch_optional(pool)
        .await
}

pub async fn list_members(
    pool: &sqlx::AnyPool,
    server_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>(
        r#"
        SELECT * FROM members
        WHERE server_id = ?
        ORDER BY joined_at
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(server_id.to_string())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn update_nickname(
    pool: &sqlx::AnyPool,
    user_id: Uuid,
    server_id: Uuid,
    nickname: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE members SET nickname = ? WHERE user_id = ? AND server_id = ?")
        .bind(nickname)
        .bind(user_id.to_string())
        .bind(server_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn is_member(
    pool: &sqlx::AnyPool,
    user_id: Uuid,
    server_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM members WHERE user_id = ? AND server_id = ?)")
            .bind(user_id.to_string())
            .bind(server_id.to_string())
            .fetch_one(pool)
            .await?;
    Ok(result.0)
}
