//! Typing-state bookkeeping (§4.7): an 8-second auto-expiring entry per
//! (channel, principal), swept on a background tick — the same
//! register/sweep shape `ids_core::rate_limiter` uses for its window buckets,
//! applied here to typing state instead of request counts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use ids_common::events::{BusEvent, Topic};
use ids_core::EventBus;

pub struct TypingTracker {
    entries: RwLock<HashMap<(Uuid, Uuid), Instant>>,
    ttl: Duration,
}

impl TypingTracker {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Install or refresh the entry for (channel, principal).
    pub async fn refresh(&self, channel: Uuid, principal: Uuid) {
        self.entries
            .write()
            .await
            .insert((channel, principal), Instant::now() + self.ttl);
    }

    /// Cancel the entry if present. Returns true if one was removed.
    pub async fn cancel(&self, channel: Uuid, principal: Uuid) -> bool {
        self.entries.write().await.remove(&(channel, principal)).is_some()
    }

    /// Remove every entry for `principal`, across all channels — used on
    /// socket close to release state synchronously (§4.7's cancellation
    /// clause).
    pub async fn cancel_all_for_principal(&self, principal: Uuid) -> Vec<Uuid> {
        let mut guard = self.entries.write().await;
        let channels: Vec<Uuid> = guard
            .keys()
            .filter(|(_, p)| *p == principal)
            .map(|(c, _)| *c)
            .collect();
        for channel in &channels {
            guard.remove(&(*channel, principal));
        }
        channels
    }

    /// Remove and return every (channel, principal) pair whose TTL has
    /// elapsed.
    async fn sweep_expired(&self) -> Vec<(Uuid, Uuid)> {
        let now = Instant::now();
        let mut guard = self.entries.write().await;
        let expired: Vec<(Uuid, Uuid)> = guard
            .iter()
            .filter(|(_, expiry)| **expiry <= now)
            .map(|(k, _)| *k)
            .collect();
        for key in &expired {
            guard.remove(key);
        }
        expired
    }
}

/// Periodically sweeps expired typing entries and publishes
/// `typing.update{active:false}` for each, fulfilling §8 scenario 8 without
/// requiring the client to send an explicit `typing.stop`.
pub fn spawn_typing_sweeper(tracker: Arc<TypingTracker>, bus: EventBus, server_lookup: ChannelServerLookup) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            for (channel_id, user_id) in tracker.sweep_expired().await {
                let Some(server_id) = server_lookup.server_for(channel_id).await else {
                    continue;
                };
                bus.publish(BusEvent {
                    topic: Topic::TypingUpdate,
                    ts: chrono::Utc::now(),
                    server_id,
                    channel_id: Some(channel_id),
                    origin_principal: Some(user_id),
                    data: serde_json::json!({ "user_id": user_id, "active": false }),
                });
            }
        }
    });
}

/// Resolves a channel's owning server for the sweeper, which only has
/// `channel_id` to work with once an entry expires.
#[derive(Clone)]
pub struct ChannelServerLookup {
    pool: sqlx::AnyPool,
}

impl ChannelServerLookup {
    pub fn new(pool: sqlx::AnyPool) -> Self {
        Self { pool }
    }

    pub async fn server_for(&self, channel_id: Uuid) -> Option<Uuid> {
        ids_db::repository::channels::find_by_id(&self.pool, channel_id)
            .await
            .ok()
            .flatten()
            .map(|c| c.server_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refresh_then_cancel_removes_entry() {
        let tracker = TypingTracker::new(8);
        let channel = Uuid::new_v4();
        let principal = Uuid::new_v4();
        tracker.refresh(channel, principal).await;
        assert!(tracker.cancel(channel, principal).await);
        assert!(!tracker.cancel(channel, principal).await);
    }

    #[tokio::test]
    async fn cancel_all_for_principal_covers_multiple_channels() {
        let tracker = TypingTracker::new(8);
        let principal = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        tracker.refresh(a, principal).await;
        tracker.refresh(b, principal).await;
        let mut channels = tracker.cancel_all_for_principal(principal).await;
        channels.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(channels, expected);
    }

    #[tokio::test]
    async fn sweep_expired_only_removes_elapsed_entries() {
        let tracker = TypingTracker::new(0);
        let channel = Uuid::new_v4();
        let principal = Uuid::new_v4();
        tracker.refresh(channel, principal).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let expired = tracker.sweep_expired().await;
        assert_eq!(expired, vec![(channel, principal)]);
        assert!(tracker.sweep_expired().await.is_empty());
    }
}
