//! Voice hub frame types (§4.8). The client side is a closed three-frame
//! set — heartbeat, fingerprint, and the opaque signal relay — mirroring how
//! `ids-gateway/src/events.rs` types its own socket.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    #[serde(rename = "voice.heartbeat")]
    Heartbeat { server: Uuid, channel: Uuid },
    #[serde(rename = "voice.fingerprint")]
    Fingerprint {
        server: Uuid,
        channel: Uuid,
        fingerprint: String,
    },
    #[serde(rename = "voice.signal")]
    Signal {
        server: Uuid,
        channel: Uuid,
        target_user_id: Uuid,
        signal_type: String,
        payload: serde_json::Value,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Connected {
        user_id: Uuid,
    },
    #[serde(rename = "voice.signal")]
    Signal {
        from_user_id: Uuid,
        signal_type: String,
        payload: serde_json::Value,
    },
    Error {
        code: String,
        error: String,
    },
    /// Sent to a socket whose prior connection was just reaped by a newer one.
    Superseded,
}

impl ServerFrame {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"type":"error","code":"internal","error":"encode failure"}"#.into())
    }
}
