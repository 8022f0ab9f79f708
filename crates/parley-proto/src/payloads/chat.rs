//! Chat message body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PayloadError, UserId};

/// A chat message as it appears on the wire.
///
/// Used for outbound SEND bodies, inbound MESSAGE bodies and entries of a
/// directory conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    /// Author of the message.
    #[serde(deserialize_with = "super::user_id")]
    pub sender_id: UserId,
    /// Intended recipient.
    #[serde(deserialize_with = "super::user_id")]
    pub recipient_id: UserId,
    /// Message text.
    pub content: String,
    /// Send time. `None` when the backend omitted it.
    #[serde(
        default,
        deserialize_with = "super::timestamp",
        serialize_with = "super::serialize_timestamp"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatPayload {
    /// Decode a JSON body.
    pub fn from_json(raw: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Decode a JSON array of messages, as returned by history lookups.
    pub fn list_from_json(raw: &str) -> Result<Vec<Self>, PayloadError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Encode as a JSON body.
    pub fn to_json(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string(self)?)
    }
}
