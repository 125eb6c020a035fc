use std::fmt;
use std::str::FromStr;

use prlive_frame::{Envelope, InboundKind};
use serde_json::Value;

use crate::error::ChannelError;

/// Names subscribers register under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    PrUpdate,
    NewSuggestion,
    NewComment,
    SuggestionStatusChange,
    /// Any inbound kind without a dedicated event.
    Message,
    Connected,
    Disconnected,
    Error,
}

impl EventName {
    pub const ALL: [EventName; 8] = [
        EventName::PrUpdate,
        EventName::NewSuggestion,
        EventName::NewComment,
        EventName::SuggestionStatusChange,
        EventName::Message,
        EventName::Connected,
        EventName::Disconnected,
        EventName::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrUpdate => "prUpdate",
            Self::NewSuggestion => "newSuggestion",
            Self::NewComment => "newComment",
            Self::SuggestionStatusChange => "suggestionStatusChange",
            Self::Message => "message",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
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
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown event name '{s}'"))
    }
}

/// An emission delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    PrUpdate(Value),
    NewSuggestion(Value),
    NewComment(Value),
    SuggestionStatusChange(Value),
    /// An inbound envelope whose kind has no dedicated event.
    Message(Envelope),
    Connected,
    /// The socket closed. Code and reason are present when the peer sent them.
    Disconnected {
        code: Option<u16>,
        reason: Option<String>,
    },
    Error(ChannelError),
}

impl ChannelEvent {
    /// The name this event is delivered under.
    pub fn name(&self) -> EventName {
        match self {
            Self::PrUpdate(_) => EventName::PrUpdate,
            Self::NewSuggestion(_) => EventName::NewSuggestion,
            Self::NewComment(_) => EventName::NewComment,
            Self::SuggestionStatusChange(_) => EventName::SuggestionStatusChange,
            Self::Message(_) => EventName::Message,
            Self::Connected => EventName::Connected,
            Self::Disconnected { .. } => EventName::Disconnected,
            Self::Error(_) => EventName::Error,
        }
    }

    /// The wire `type` of the envelope this event was routed from. Lifecycle
    /// and error events have none.
    pub fn wire_type(&self) -> Option<&str> {
        let kind = match self {
            Self::PrUpdate(_) => InboundKind::PrUpdate,
            Self::NewSuggestion(_) => InboundKind::NewSuggestion,
            Self::NewComment(_) => InboundKind::NewComment,
            Self::SuggestionStatusChange(_) => InboundKind::SuggestionStatusChange,
            Self::Message(envelope) => return Some(envelope.kind.as_str()),
            _ => return None,
        };
        Some(kind.as_type())
    }

    /// The server payload, for events that carry one.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::PrUpdate(payload)
            | Self::NewSuggestion(payload)
            | Self::NewComment(payload)
            | Self::SuggestionStatusChange(payload) => Some(payload),
            Self::Message(envelope) => Some(&envelope.payload),
            _ => None,
        }
    }
}
