//! Connection health check, backend-agnostic via `AnyPool`.

use sqlx::AnyPool;

/// Health check — verify the database is reachable.
pub async fn health_check(pool: &AnyPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
