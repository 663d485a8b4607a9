//! # ids-gateway
//!
//! The messaging gateway (C7): an authenticated WebSocket at `/gateway/ws`
//! that routes in-process bus events (C6) to subscribers and accepts
//! subscribe/typing/read-ack frames from the client. Token verification
//! happens once, before upgrade; everything else is a single per-connection
//! task with no shared mutable session table, since nothing in §4.7 requires
//! cross-connection bookkeeping beyond typing state.

pub mod events;
pub mod session;

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
use futures_util::{SinkExt, StreamExt};
use ids_common::events::{BusEvent, Topic};
use ids_core::{resolver, EventBus};
use ids_db::{repository::members, repository::read_states, Database};
use serde::Deserialize;
use session::{spawn_typing_sweeper, ChannelServerLookup, TypingTracker};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use events::{bus_frame, ClientFrame, ServerFrame};

#[derive(Clone)]
pub struct GatewayState {
    pub db: Database,
    pub bus: EventBus,
    pub typing: Arc<TypingTracker>,
}

impl GatewayState {
    pub fn new(db: Database, bus: EventBus) -> Self {
        let typing = Arc::new(TypingTracker::new(ids_common::config::get().limits.typing_expire_secs));
        spawn_typing_sweeper(typing.clone(), bus.clone(), ChannelServerLookup::new(db.pool.clone()));
        Self { db, bus, typing }
    }
}

pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/gateway/ws", get(ws_handler))
        .with_state(Arc::new(state))
}

#[derive(Debug, Deserialize)]
struct ConnectQuery {
    token: String,
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
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

async fn handle_connection(socket: WebSocket, state: Arc<GatewayState>, principal: Uuid) {
    let (mut sender, mut receiver) = socket.split();
    let mut bus_rx = state.bus.subscribe();
    let mut subscribed: HashSet<(Uuid, Uuid)> = HashSet::new();

    if sender
        .send(Message::Text(ServerFrame::Connected { user_id: principal }.to_json().into()))
        .await
        .is_err()
    {
        return;
    }

    let ping_every = Duration::from_secs(ids_common::config::get().limits.gateway_ping_secs);
    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.tick().await; // first tick fires immediately
    let mut awaiting_pong = false;

    loop {
        tokio::select! {
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(()) = handle_client_frame(&text, &state, principal, &mut subscribed, &mut sender).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        awaiting_pong = false;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
            event = bus_rx.recv() => {
                let Ok(event) = event else { continue };
                if !forward_event(&state, &event, principal, &mut subscribed, &mut sender).await {
                    break;
                }
            }
            _ = ping_tick.tick() => {
                if awaiting_pong {
                    break;
                }
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
                awaiting_pong = true;
            }
        }
    }

    let lookup = ChannelServerLookup::new(state.db.pool.clone());
    for channel_id in state.typing.cancel_all_for_principal(principal).await {
        if let Some(server_id) = lookup.server_for(channel_id).await {
            state.bus.publish(BusEvent {
                topic: Topic::TypingUpdate,
                ts: chrono::Utc::now(),
                server_id,
                channel_id: Some(channel_id),
                origin_principal: Some(principal),
                data: serde_json::json!({ "user_id": principal, "active": false }),
            });
        }
    }

    tracing::info!(principal = %principal, "gateway connection closed");
}

async fn handle_client_frame(
    text: &str,
    state: &Arc<GatewayState>,
    principal: Uuid,
    subscribed: &mut HashSet<(Uuid, Uuid)>,
    sender: &mut (impl futures_util::Sink<Message> + Unpin),
) -> Result<(), ()> {
    let Ok(frame) = serde_json::from_str::<ClientFrame>(text) else {
        return Ok(());
    };

    let reply = match frame {
        ClientFrame::Heartbeat => Some(ServerFrame::HeartbeatAck),
        ClientFrame::Subscribe { server_id, channel_id } => {
            match authorize_subscribe(&state.db.pool, principal, server_id, channel_id).await {
                Ok(true) => {
                    subscribed.insert((server_id, channel_id));
                    Some(ServerFrame::Subscribed { channel_id })
                }
                Ok(false) => Some(ServerFrame::Error {
                    code: "forbidden".into(),
                    error: "missing view_channel permission".into(),
                }),
                Err(_) => Some(ServerFrame::Error {
                    code: "internal".into(),
                    error: "lookup failed".into(),
                }),
            }
        }
        ClientFrame::Unsubscribe { channel_id } => {
            subscribed.retain(|(_, c)| *c != channel_id);
            Some(ServerFrame::Unsubscribed { channel_id })
        }
        ClientFrame::TypingStart { server_id, channel_id } => {
            state.typing.refresh(channel_id, principal).await;
            state.bus.publish(BusEvent {
                topic: Topic::TypingUpdate,
                ts: chrono::Utc::now(),
                server_id,
                channel_id: Some(channel_id),
                origin_principal: Some(principal),
                data: serde_json::json!({ "user_id": principal, "active": true }),
            });
            None
        }
        ClientFrame::TypingStop { channel_id } => {
            if state.typing.cancel(channel_id, principal).await {
                if let Some(server_id) =
                    ChannelServerLookup::new(state.db.pool.clone()).server_for(channel_id).await
                {
                    state.bus.publish(BusEvent {
                        topic: Topic::TypingUpdate,
                        ts: chrono::Utc::now(),
                        server_id,
                        channel_id: Some(channel_id),
                        origin_principal: Some(principal),
                        data: serde_json::json!({ "user_id": principal, "active": false }),
                    });
                }
            }
            None
        }
        ClientFrame::ReadAck { server_id, channel_id, message_id } => {
            if read_states::ack_message(&state.db.pool, principal, channel_id, message_id)
                .await
                .is_ok()
            {
                state.bus.publish(BusEvent {
                    topic: Topic::ReadReceipt,
                    ts: chrono::Utc::now(),
                    server_id,
                    channel_id: Some(channel_id),
                    origin_principal: Some(principal),
                    data: serde_json::json!({ "user_id": principal, "message_id": message_id }),
                });
            }
            None
        }
    };

    if let Some(frame) = reply {
        if sender.send(Message::Text(frame.to_json().into())).await.is_err() {
            return Err(());
        }
    }
    Ok(())
}

async fn authorize_subscribe(
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

/// Forwards a bus event to this connection if subscribed, applying the
/// origin-principal exclusion (§4.6) and the lockdown force-unsubscribe rule
/// (§4.9(e)). Returns false if the socket should be torn down.
async fn forward_event(
    state: &Arc<GatewayState>,
    event: &BusEvent,
    principal: Uuid,
    subscribed: &mut HashSet<(Uuid, Uuid)>,
    sender: &mut (impl futures_util::Sink<Message> + Unpin),
) -> bool {
    use ids_common::events::Scope;

    if event.topic == Topic::ChannelLockdown
        && event.data.get("lockdown").and_then(|v| v.as_bool()) == Some(true)
    {
        if let Some(channel_id) = event.channel_id {
            if subscribed.contains(&(event.server_id, channel_id)) {
                if let Ok(level) = resolver::resolve_security_level(&state.db.pool, principal, event.server_id).await {
                    let threshold = ids_common::config::get().limits.lockdown_unsubscribe_threshold;
                    if level < threshold {
                        subscribed.remove(&(event.server_id, channel_id));
                        let _ = sender
                            .send(Message::Text(ServerFrame::Unsubscribed { channel_id }.to_json().into()))
                            .await;
                    }
                }
            }
        }
    }

    let excludes_origin = matches!(event.topic, Topic::MessageCreated | Topic::TypingUpdate);
    if excludes_origin && event.origin_principal == Some(principal) {
        return true;
    }

    let should_forward = match event.scope() {
        Scope::Channel => event.channel_id.is_some_and(|c| subscribed.contains(&(event.server_id, c))),
        Scope::Server => subscribed.iter().any(|(s, _)| *s == event.server_id),
    };

    if !should_forward {
        return true;
    }

    sender
        .send(Message::Text(bus_frame(event.topic, &event.data).into()))
        .await
        .is_ok()
}
