use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub mod controller;

/// Opaque session identifier. The backend may send it as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    #[cfg(test)]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(value) => Self(value.to_string()),
            RawId::Text(value) => Self(value),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(if raw == "user" { Self::User } else { Self::Agent })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[cfg(test)]
impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            content: content.into(),
            timestamp: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl SessionSummary {
    pub fn title(&self) -> String {
        format!("Session {}", self.session_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDetail {
    pub session_id: SessionId,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageAck {
    #[serde(default)]
    pub message_id: Option<i64>,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_accepts_numbers_and_strings() {
        let numeric: SessionSummary =
            serde_json::from_str(r#"{"session_id": 7, "created_at": "2025-06-01T10:00:00"}"#)
                .expect("numeric id should deserialize");
        assert_eq!(numeric.session_id, SessionId::new("7"));
        assert_eq!(numeric.title(), "Session 7");

        let text: SessionSummary = serde_json::from_str(r#"{"session_id": "abc"}"#)
            .expect("string id should deserialize");
        assert_eq!(text.session_id, SessionId::new("abc"));
        assert_eq!(text.created_at, None);
    }

    #[test]
    fn session_detail_maps_roles() {
        let detail: SessionDetail = serde_json::from_str(
            r#"{
  "session_id": 3,
  "created_at": "2025-06-01T10:00:00",
  "messages": [
    {"role": "user", "content": "open the browser", "timestamp": "2025-06-01T10:00:01"},
    {"role": "agent", "content": "Done."},
    {"role": "assistant", "content": "Also done."},
    {"role": "system", "content": "odd"}
  ]
}"#,
        )
        .expect("session detail should deserialize");

        let roles: Vec<Role> = detail.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Agent, Role::Agent, Role::Agent]);
    }

    #[test]
    fn message_ack_needs_only_content() {
        let ack: MessageAck = serde_json::from_str(
            r#"{"message_id": 12, "content": "hi", "timestamp": "t", "status": "message_saved"}"#,
        )
        .expect("ack should deserialize");
        assert_eq!(ack.content, "hi");
        assert_eq!(ack.status.as_deref(), Some("message_saved"));
    }
}
