//! Named-event frames exchanged over the websocket.
//!
//! Every text frame is a JSON object of the form `{"event": <name>, "data": <payload>}`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChatEvent, ChatMessage},
    error::{ApiError, ApiException},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    Join,
    Chat,
    Typing,
    Leave,
    Participant,
    Error,
}

impl EventName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Chat => "chat",
            Self::Typing => "typing",
            Self::Leave => "leave",
            Self::Participant => "participant",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = ApiException;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "join" => Ok(Self::Join),
            "chat" => Ok(Self::Chat),
            "typing" => Ok(Self::Typing),
            "leave" => Ok(Self::Leave),
            "participant" => Ok(Self::Participant),
            "error" => Ok(Self::Error),
            other => Err(ApiException::validation(format!("unknown event '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientFrame {
    Join(String),
    Chat(ChatMessage),
    Typing(String),
    Leave(String),
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl ClientFrame {
    pub fn name(&self) -> EventName {
        match self {
            Self::Join(_) => EventName::Join,
            Self::Chat(_) => EventName::Chat,
            Self::Typing(_) => EventName::Typing,
            Self::Leave(_) => EventName::Leave,
        }
    }

    /// Decodes a client frame. A `chat` payload may also arrive as a JSON string
    /// holding the message object, which is how browser clients stringify it.
    pub fn decode(text: &str) -> Result<Self, ApiException> {
        let raw: RawFrame = serde_json::from_str(text)
            .map_err(|e| ApiException::validation(format!("malformed frame: {e}")))?;

        match raw.event.parse::<EventName>()? {
            EventName::Join => Ok(Self::Join(string_payload(EventName::Join, raw.data)?)),
            EventName::Typing => Ok(Self::Typing(string_payload(EventName::Typing, raw.data)?)),
            EventName::Leave => Ok(Self::Leave(string_payload(EventName::Leave, raw.data)?)),
            EventName::Chat => {
                let message = match raw.data {
                    serde_json::Value::String(encoded) => serde_json::from_str(&encoded),
                    other => serde_json::from_value(other),
                }
                .map_err(|e| ApiException::validation(format!("invalid chat payload: {e}")))?;
                Ok(Self::Chat(message))
            }
            other => Err(ApiException::validation(format!(
                "event '{other}' cannot be sent by clients"
            ))),
        }
    }
}

fn string_payload(event: EventName, data: serde_json::Value) -> Result<String, ApiException> {
    match data {
        serde_json::Value::String(value) => Ok(value),
        _ => Err(ApiException::validation(format!(
            "'{event}' payload must be a string"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerFrame {
    Chat(ChatEvent),
    Typing(String),
    Participant(usize),
    Error(ApiError),
}

impl ServerFrame {
    pub fn name(&self) -> EventName {
        match self {
            Self::Chat(_) => EventName::Chat,
            Self::Typing(_) => EventName::Typing,
            Self::Participant(_) => EventName::Participant,
            Self::Error(_) => EventName::Error,
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
