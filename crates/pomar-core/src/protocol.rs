//! Wire frames.
//!
//! Every WebSocket text frame carries one JSON object discriminated by its
//! `type` field. Frames are decoded once at the boundary into [`Frame`].

use crate::{Message, UserId};
use serde::{Deserialize, Deserializer, Serialize};

/// A protocol frame, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Frame {
    /// A chat message.
    Message {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        /// Display name of the sender (outgoing and relay messages).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender_id: Option<UserId>,
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
    /// Announces a client's identity to everyone on the relay.
    Identify {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_id: Option<UserId>,
    },
    /// The relay assigns this client an id.
    IdClient {
        #[serde(deserialize_with = "id_text")]
        content: String,
    },
    /// Number of connected clients.
    UserCount { count: u32 },
    /// A client left; `content` is its string-encoded id.
    #[serde(rename = "userDesconect")]
    UserDesconect {
        #[serde(deserialize_with = "id_text")]
        content: String,
    },
    /// Asks peers for history the requester is missing.
    SyncRequest {
        client_id: UserId,
        #[serde(default)]
        username: String,
        message_count: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_client_id: Option<UserId>,
    },
    /// A peer's full history, addressed to one requester.
    SyncResponse {
        target_client_id: UserId,
        #[serde(default)]
        history: Vec<Message>,
        #[serde(default)]
        sender: String,
        sender_id: UserId,
    },
    /// Any frame type this client does not handle.
    #[serde(other)]
    Unknown,
}

impl Frame {
    /// Decode one text frame.
    ///
    /// Valid JSON without a string `type` field decodes to [`Frame::Unknown`].
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let value: serde_json::Value = serde_json::from_str(text).map_err(FrameError::Malformed)?;
        if !value.get("type").is_some_and(serde_json::Value::is_string) {
            return Ok(Frame::Unknown);
        }
        serde_json::from_value(value).map_err(FrameError::Shape)
    }

    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String, FrameError> {
        serde_json::to_string(self).map_err(FrameError::Encode)
    }

    /// The wire discriminator, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Message { .. } => "message",
            Frame::Identify { .. } => "identify",
            Frame::IdClient { .. } => "idClient",
            Frame::UserCount { .. } => "userCount",
            Frame::UserDesconect { .. } => "userDesconect",
            Frame::SyncRequest { .. } => "syncRequest",
            Frame::SyncResponse { .. } => "syncResponse",
            Frame::Unknown => "unknown",
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdText {
    Text(String),
    Number(u64),
}

/// Accepts ids sent either as strings or as bare numbers.
fn id_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match IdText::deserialize(deserializer)? {
        IdText::Text(text) => text,
        IdText::Number(n) => n.to_string(),
    })
}

/// Error decoding or encoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("frame does not match its type: {0}")]
    Shape(#[source] serde_json::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}
