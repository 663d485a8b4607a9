//! Gateway frame types (§4.7) — inbound client frames are a closed,
//! strictly-typed enum; outbound frames that merely forward a bus payload are
//! built as plain JSON objects tagged with the bus topic's wire name, since
//! their shape is whatever the producer published.

use ids_common::events::Topic;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Frames the client may send, discriminated by `type` (§4.7's inbound table).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Heartbeat,
    Subscribe {
        server_id: Uuid,
        channel_id: Uuid,
    },
    Unsubscribe {
        channel_id: Uuid,
    },
    #[serde(rename = "typing.start")]
    TypingStart {
        server_id: Uuid,
        channel_id: Uuid,
    },
    #[serde(rename = "typing.stop")]
    TypingStop {
        channel_id: Uuid,
    },
    #[serde(rename = "read.ack")]
    ReadAck {
        server_id: Uuid,
        channel_id: Uuid,
        message_id: Uuid,
    },
}

/// Frames the server originates directly (not forwarded from the bus).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Connected { user_id: Uuid },
    Subscribed { channel_id: Uuid },
    Unsubscribed { channel_id: Uuid },
    #[serde(rename = "heartbeat_ack")]
    HeartbeatAck,
    Error { code: String, error: String },
}

impl ServerFrame {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"error","code":"internal","error":"encode failure"}"#.into())
    }
}

/// Wrap a bus event's payload as an outbound frame tagged with the topic's
/// wire name (`message.created`, `channel.lockdown`, ...).
pub fn bus_frame(topic: Topic, data: &serde_json::Value) -> String {
    let mut obj = data.clone();
    if let Some(map) = obj.as_object_mut() {
        map.insert("type".into(), serde_json::Value::String(topic.as_str().into()));
        return obj.to_string();
    }
    serde_json::json!({ "type": topic.as_str(), "data": data }).to_string()
}
