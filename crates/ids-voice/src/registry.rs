//! Live-socket registry for the voice hub — maps a connected principal to a
//! channel it can use to push frames onto their socket. This is the only
//! in-memory state the hub keeps; membership itself lives in
//! `voice_memberships` (`ids-db`), so this registry exists purely to make
//! `voice.signal` relay and per-principal uniqueness (§4.8) possible.
//!
//! Shaped after `room.rs`'s `HashMap<Uuid, _>` participant map, collapsed to
//! one level since relay targets by user id, not by channel.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::events::ServerFrame;

#[derive(Clone, Default)]
pub struct SignalRegistry {
    sockets: Arc<RwLock<HashMap<Uuid, mpsc::UnboundedSender<ServerFrame>>>>,
}

impl SignalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly connected principal's outbound channel. Returns the
    /// sender a prior connection for this principal was using, if any — the
    /// caller uses this to tell the old socket to close (§4.8's one-live-
    /// socket-per-principal rule).
    pub async fn register(
        &self,
        principal: Uuid,
        tx: mpsc::UnboundedSender<ServerFrame>,
    ) -> Option<mpsc::UnboundedSender<ServerFrame>> {
        self.sockets.write().await.insert(principal, tx)
    }

    /// Removes the registry entry if it still belongs to `tx` — guards
    /// against a closing old connection clobbering a newer one's entry.
    pub async fn remove_if_current(&self, principal: Uuid, tx: &mpsc::UnboundedSender<ServerFrame>) {
        let mut guard = self.sockets.write().await;
        if guard.get(&principal).is_some_and(|existing| existing.same_channel(tx)) {
            guard.remove(&principal);
        }
    }

    pub async fn send_to(&self, target: Uuid, frame: ServerFrame) -> bool {
        if let Some(tx) = self.sockets.read().await.get(&target) {
            return tx.send(frame).is_ok();
        }
        false
    }
}
