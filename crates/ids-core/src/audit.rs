//! Audit sink (C5) — synchronous append, paginated retrieval, and the
//! `audit.created` bus fan-out §4.5 requires on every write.

use chrono::Utc;
use ids_common::error::IdsError;
use ids_common::events::{BusEvent, Topic};
use ids_common::models::audit::{AuditLogQuery, AuditResult, SecureAuditEntry};
use ids_db::repository::audit as audit_repo;
use uuid::Uuid;

use crate::bus::EventBus;

#[derive(Clone)]
pub struct AuditSink {
    pool: sqlx::AnyPool,
    bus: EventBus,
}

impl AuditSink {
    pub fn new(pool: sqlx::AnyPool, bus: EventBus) -> Self {
        Self { pool, bus }
    }

    /// Appends synchronously, then fires `audit.created`. Per §4.9's failure
    /// semantics, a caller that cannot tolerate an audit failure should treat
    /// an `Err` here as fatal to the originating mutation; callers that only
    /// want best-effort logging (e.g. rule-engine denials) should ignore it.
    #[allow(clippy::too_many_arguments)]
    pub async fn append(
        &self,
        server_id: Uuid,
        channel_id: Option<Uuid>,
        principal_id: Uuid,
        action: &str,
        permission_checked: &str,
        result: AuditResult,
        metadata: Option<&str>,
    ) -> Result<SecureAuditEntry, IdsError> {
        let entry = audit_repo::append(
            &self.pool,
            ids_common::snowflake::generate_id(),
            server_id,
            channel_id,
            principal_id,
            action,
            permission_checked,
            result,
            metadata,
            None,
            None,
        )
        .await?;

        self.bus.publish(BusEvent {
            topic: Topic::AuditCreated,
            ts: Utc::now(),
            server_id,
            channel_id,
            origin_principal: Some(principal_id),
            data: serde_json::json!({
                "id": entry.id,
                "action": entry.action,
                "permission_checked": entry.permission_checked,
                "result": entry.result,
            }),
        });

        Ok(entry)
    }

    /// Best-effort variant used by rule-engine denials: logs on failure but
    /// never propagates, matching §7's audit-sink failure policy.
    #[allow(clippy::too_many_arguments)]
    pub async fn append_best_effort(
        &self,
        server_id: Uuid,
        channel_id: Option<Uuid>,
        principal_id: Uuid,
        action: &str,
        permission_checked: &str,
        result: AuditResult,
        metadata: Option<&str>,
    ) {
        if let Err(err) = self
            .append(
                server_id,
                channel_id,
                principal_id,
                action,
                permission_checked,
                result,
                metadata,
            )
            .await
        {
            tracing::error!(error = %err, action, "audit sink write failed");
        }
    }

    pub async fn list(
        &self,
        server_id: Uuid,
        channel_id: Option<Uuid>,
        query: &AuditLogQuery,
    ) -> Result<Vec<SecureAuditEntry>, IdsError> {
        Ok(audit_repo::list(&self.pool, server_id, channel_id, query).await?)
    }
}
