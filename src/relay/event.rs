use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Recipient sentinel meaning "everyone who is online".
pub const ALL: &str = "all";

/// `None`, `""` and `"all"` all address the whole room.
pub fn is_broadcast(to: Option<&str>) -> bool {
    matches!(to, None | Some("") | Some(ALL))
}

/// A chat message as submitted by a client. Fields the relay doesn't know
/// about ride along in `extra` untouched. The older `file` and `time` names
/// are accepted on the way in but always go back out as `fileRef` and
/// `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default, alias = "file", skip_serializing_if = "Option::is_none")]
    pub file_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Whatever the client's clock said, in whatever shape it sent it.
    #[serde(default, alias = "time", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Message {
    pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: Some(to.into()),
            text: text.into(),
            file_ref: None,
            reply_to: None,
            timestamp: None,
            extra: Map::new(),
        }
    }

    pub fn is_broadcast(&self) -> bool {
        is_broadcast(self.to.as_deref())
    }
}

/// Frames a client sends over its socket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inbound {
    #[serde(rename_all = "camelCase")]
    Register {
        user_id: String,
        #[serde(default)]
        name: Option<String>,
    },
    Message(Message),
    Typing {
        from: String,
        #[serde(default)]
        to: Option<String>,
    },
}

impl Inbound {
    /// Anything that isn't a well-formed frame is `None`; the caller drops it.
    pub fn parse(frame: &[u8]) -> Option<Self> {
        match serde_json::from_slice(frame) {
            Ok(inbound) => Some(inbound),
            Err(err) => {
                tracing::debug!(error = %err, "dropping malformed frame");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// Frames the relay pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outbound {
    #[serde(rename_all = "camelCase")]
    Roster { user_ids: Vec<String> },
    #[serde(rename_all = "camelCase")]
    Presence {
        user_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        status: PresenceStatus,
    },
    Message(Message),
    Typing { from: String },
}

impl Outbound {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
