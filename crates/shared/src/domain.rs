use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Seconds since the unix epoch.
pub type Timestamp = i64;

pub fn unix_now() -> Timestamp {
    Utc::now().timestamp()
}

/// A chat message as typed by a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user: String,
    pub timestamp: Timestamp,
    pub message: String,
}

impl ChatMessage {
    pub fn new(user: impl Into<String>, message: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            user: user.into(),
            timestamp,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Join,
    Leave,
    Message,
}

/// A room event as broadcast to every participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChatEvent {
    pub evt_type: EventKind,
    pub user: String,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub text: String,
}

impl ChatEvent {
    pub fn join(user: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            evt_type: EventKind::Join,
            user: user.into(),
            timestamp,
            text: String::new(),
        }
    }

    pub fn leave(user: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            evt_type: EventKind::Leave,
            user: user.into(),
            timestamp,
            text: String::new(),
        }
    }

    pub fn from_message(message: ChatMessage) -> Self {
        Self {
            evt_type: EventKind::Message,
            user: message.user,
            timestamp: message.timestamp,
            text: message.message,
        }
    }
}
