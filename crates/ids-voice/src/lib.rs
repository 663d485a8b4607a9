//! # ids-voice
//!
//! The voice signaling hub (C8): an authenticated duplex socket at
//! `/voice/ws` that tracks heartbeats, fingerprint updates, and relays
//! opaque peer-to-peer signal payloads between the two current members of a
//! voice channel. Room membership, mute/deafen/camera state, and stage
//! promotion all live on the REST surface (`ids-api/src/routes/voice.rs`)
//! against `voice_memberships` — this crate only owns the live socket and
//! the background reaper for stale rows.

pub mod events;
pub mod registry;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Duration as ChronoDuration;
use futures_util::{SinkExt, StreamExt};
use ids_common::events::{BusEvent, Topic};
use ids_core::resolver;
use ids_db::{repository::members, repository::voice_memberships, Database};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

use events::{ClientFrame, ServerFrame};
use registry::SignalRegistry;

#[derive(Clone)]
pub struct VoiceState {
    pub db: Database,
    pub bus: ids_core::EventBus,
    registry: SignalRegistry,
}

impl VoiceState {
    pub fn new(db: Database, bus: ids_core::EventBus) -> Self {
        let state = Self {
            db,
            bus,
            registry: SignalRegistry::new(),
        };
        spawn_reaper(state.clone());
        state
    }
}

pub fn build_router(state: VoiceState) -> Router {
    Router::new()
        .route("/voice/ws", get(ws_handler))
        .with_state(Arc::new(state))
}

#[derive(Debug, Deserialize)]
struct ConnectQuery {
    token: String,
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<VoiceState>>,
    Query(query): Query<ConnectQuery>,
) -> Response {
    let config = ids_common::config::get();
    let principal_id = match ids_common::auth::validate_token(&query.token, &config.auth.jwt_secret)
        .ok()
        .and_then(|claims| claims.principal_id().ok())
    {
        Some(id) => id,
        None => return (StatusCode::UNAUTHORIZED, "unauthorized").into_response(),
    };

    ws.on_upgrade(move |socket| handle_connection(socket, state, principal_id))
}

async fn handle_connection(socket: WebSocket, state: Arc<VoiceState>, principal: Uuid) {
    let (mut sender, mut receiver) = socket.split();
    let (relay_tx, mut relay_rx) = mpsc::unbounded_channel::<ServerFrame>();

    // §4.8: at most one live socket per principal. A prior connection, if
    // any, gets told it's superseded; its own cleanup reaps its voice row.
    if let Some(previous) = state.registry.register(principal, relay_tx.clone()).await {
        let _ = previous.send(ServerFrame::Superseded);
    }

    if sender
        .send(Message::Text(ServerFrame::Connected { user_id: principal }.to_json().into()))
        .await
        .is_err()
    {
        state.registry.remove_if_current(principal, &relay_tx).await;
        return;
    }

    loop {
        tokio::select! {
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if handle_client_frame(&text, &state, principal, &mut sender).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
            relayed = relay_rx.recv() => {
                let Some(frame) = relayed else { break };
                let superseded = matches!(frame, ServerFrame::Superseded);
                if sender.send(Message::Text(frame.to_json().into())).await.is_err() || superseded {
                    break;
                }
            }
        }
    }

    state.registry.remove_if_current(principal, &relay_tx).await;
    if let Ok(Some(membership)) = voice_memberships::find_by_user(&state.db.pool, principal).await {
        let _ = voice_memberships::leave(&state.db.pool, principal).await;
        state.bus.publish(BusEvent {
            topic: Topic::VoiceLeave,
            ts: chrono::Utc::now(),
            server_id: membership.server_id,
            channel_id: Some(membership.channel_id),
            origin_principal: Some(principal),
            data: serde_json::json!({ "user_id": principal }),
        });
    }

    tracing::info!(principal = %principal, "voice connection closed");
}

async fn handle_client_frame(
    text: &str,
    state: &Arc<VoiceState>,
    principal: Uuid,
    sender: &mut (impl futures_util::Sink<Message> + Unpin),
) -> Result<(), ()> {
    let Ok(frame) = serde_json::from_str::<ClientFrame>(text) else {
        return Ok(());
    };

    let (server, channel) = match &frame {
        ClientFrame::Heartbeat { server, channel }
        | ClientFrame::Fingerprint { server, channel, .. }
        | ClientFrame::Signal { server, channel, .. } => (*server, *channel),
    };

    // Heartbeats skip the permission check (§4.8) — they only touch a row
    // the caller already owns. Every other frame re-verifies VIEW_CHANNEL.
    if !matches!(frame, ClientFrame::Heartbeat { .. }) {
        match authorize(&state.db.pool, principal, server, channel).await {
            Ok(true) => {}
            Ok(false) => {
                return send_error(sender, "forbidden", "missing view_channel permission").await;
            }
            Err(_) => return send_error(sender, "internal", "permission lookup failed").await,
        }
    }

    match frame {
        ClientFrame::Heartbeat { .. } => {
            let _ = voice_memberships::touch_heartbeat(&state.db.pool, principal).await;
            Ok(())
        }
        ClientFrame::Fingerprint { fingerprint, .. } => {
            let _ = voice_memberships::set_fingerprint(&state.db.pool, principal, &fingerprint).await;
            Ok(())
        }
        ClientFrame::Signal {
            target_user_id,
            signal_type,
            payload,
            ..
        } => {
            let sender_member = voice_memberships::find_by_user(&state.db.pool, principal)
                .await
                .ok()
                .flatten();
            if !sender_member.is_some_and(|m| m.channel_id == channel) {
                return send_error(sender, "forbidden", "not a member of this voice channel").await;
            }

            let target_member = voice_memberships::find_by_user(&state.db.pool, target_user_id)
                .await
                .ok()
                .flatten();
            let same_channel = target_member.is_some_and(|m| m.channel_id == channel);
            if !same_channel {
                return send_error(sender, "forbidden", "target not in this voice channel").await;
            }
            state
                .registry
                .send_to(
                    target_user_id,
                    ServerFrame::Signal {
                        from_user_id: principal,
                        signal_type,
                        payload,
                    },
                )
                .await;
            Ok(())
        }
    }
}

async fn authorize(
    pool: &sqlx::AnyPool,
    principal: Uuid,
    server_id: Uuid,
    channel_id: Uuid,
) -> Result<bool, sqlx::Error> {
    if !members::is_member(pool, principal, server_id).await? {
        return Ok(false);
    }
    let resolved = resolver::resolve(pool, principal, server_id, Some(channel_id))
        .await
        .map_err(|_| sqlx::Error::RowNotFound)?;
    Ok(resolved.has(ids_common::permissions::Permissions::VIEW_CHANNEL))
}

async fn send_error(
    sender: &mut (impl futures_util::Sink<Message> + Unpin),
    code: &str,
    error: &str,
) -> Result<(), ()> {
    let frame = ServerFrame::Error {
        code: code.to_string(),
        error: error.to_string(),
    };
    sender
        .send(Message::Text(frame.to_json().into()))
        .await
        .map_err(|_| ())
}

/// Periodically deletes voice rows whose heartbeat is stale and broadcasts
/// `voice.timeout` for the affected channel, per §4.8's reaping policy —
/// mirrors `ids-core::rate_limiter`'s sweep task.
fn spawn_reaper(state: VoiceState) {
    tokio::spawn(async move {
        let timeout_secs = ids_common::config::get().limits.voice_heartbeat_timeout_secs;
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        loop {
            interval.tick().await;
            let cutoff = chrono::Utc::now() - ChronoDuration::seconds(timeout_secs as i64);
            reap_stale(&state, cutoff).await;
        }
    });
}

async fn reap_stale(state: &VoiceState, cutoff: chrono::DateTime<chrono::Utc>) {
    let Ok(stale) = sqlx::query_as::<_, ids_common::models::voice_membership::VoiceMembership>(
        "SELECT * FROM voice_memberships WHERE last_heartbeat < ?",
    )
    .bind(cutoff)
    .fetch_all(&state.db.pool)
    .await
    else {
        return;
    };

    if stale.is_empty() {
        return;
    }

    let mut affected_channels = std::collections::HashSet::new();
    for row in &stale {
        affected_channels.insert((row.server_id, row.channel_id));
    }

    if voice_memberships::reap_stale(&state.db.pool, cutoff).await.is_err() {
        return;
    }

    for (server_id, channel_id) in affected_channels {
        let members = voice_memberships::list_by_channel(&state.db.pool, channel_id)
            .await
            .unwrap_or_default();
        state.bus.publish(BusEvent {
            topic: Topic::VoiceTimeout,
            ts: chrono::Utc::now(),
            server_id,
            channel_id: Some(channel_id),
            origin_principal: None,
            data: serde_json::json!({ "members": members }),
        });
    }
}
