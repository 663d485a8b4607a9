//! Event bus (C6) payload shapes — the closed topic set producers publish and
//! `ids-gateway`/`ids-voice` subscribe to. Modeled as a tagged enum (per
//! SPEC_FULL.md's "replace dynamic dispatch with a closed set of tagged variants")
//! rather than the teacher's loose `{event_type: String, data: Value}` shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which subscribers an event fans out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Delivered to every subscriber of the (server, channel) pair.
    Channel,
    /// Delivered to every subscriber of the server.
    Server,
}

/// A published bus event: topic + scope + JSON payload, per §4.6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEvent {
    pub topic: Topic,
    pub ts: DateTime<Utc>,
    pub server_id: Uuid,
    pub channel_id: Option<Uuid>,
    /// The principal whose action caused this event (excluded from fanout for
    /// `message.created`, per §4.7).
    pub origin_principal: Option<Uuid>,
    pub data: serde_json::Value,
}

impl BusEvent {
    pub fn scope(&self) -> Scope {
        match self.topic {
            Topic::SecurityAlert
            | Topic::ChannelLockdown
            | Topic::ChannelSecured
            | Topic::VoiceJoin
            | Topic::VoiceLeave
            | Topic::VoiceTimeout => Scope::Server,
            _ => Scope::Channel,
        }
    }
}

/// The closed set of topics named in §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    #[serde(rename = "message.created")]
    MessageCreated,
    #[serde(rename = "message.edited")]
    MessageEdited,
    #[serde(rename = "message.deleted")]
    MessageDeleted,
    #[serde(rename = "read.receipt")]
    ReadReceipt,
    #[serde(rename = "security.alert")]
    SecurityAlert,
    #[serde(rename = "channel.lockdown")]
    ChannelLockdown,
    #[serde(rename = "channel.secured")]
    ChannelSecured,
    #[serde(rename = "audit.created")]
    AuditCreated,
    #[serde(rename = "typing.update")]
    TypingUpdate,
    #[serde(rename = "voice.join")]
    VoiceJoin,
    #[serde(rename = "voice.leave")]
    VoiceLeave,
    #[serde(rename = "voice.timeout")]
    VoiceTimeout,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::MessageCreated => "message.created",
            Topic::MessageEdited => "message.edited",
            Topic::MessageDeleted => "message.deleted",
            Topic::ReadReceipt => "read.receipt",
            Topic::SecurityAlert => "security.alert",
            Topic::ChannelLockdown => "channel.lockdown",
            Topic::ChannelSecured => "channel.secured",
            Topic::AuditCreated => "audit.created",
            Topic::TypingUpdate => "typing.update",
            Topic::VoiceJoin => "voice.join",
            Topic::VoiceLeave => "voice.leave",
            Topic::VoiceTimeout => "voice.timeout",
        }
    }
}
