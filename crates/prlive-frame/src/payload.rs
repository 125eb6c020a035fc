use serde::{Deserialize, Serialize};

use crate::kind::{NEW_COMMENT, REQUEST_ANALYSIS, SUBSCRIBE_PR, SUGGESTION_STATUS, UNSUBSCRIBE_PR};

/// A typed outbound payload with a fixed envelope kind.
pub trait OutboundMessage: Serialize {
    /// The envelope `type` this payload is sent under.
    const KIND: &'static str;
}

/// `subscribe_pr` payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubscribePr {
    pub pr_id: u64,
}

impl OutboundMessage for SubscribePr {
    const KIND: &'static str = SUBSCRIBE_PR;
}

/// `unsubscribe_pr` payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribePr {
    pub pr_id: u64,
}

impl OutboundMessage for UnsubscribePr {
    const KIND: &'static str = UNSUBSCRIBE_PR;
}

/// `new_comment` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub pr_id: u64,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
}

impl OutboundMessage for NewComment {
    const KIND: &'static str = NEW_COMMENT;
}

/// Review decision on a suggestion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Accepted,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for SuggestionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" | "accept" => Ok(Self::Accepted),
            "rejected" | "reject" => Ok(Self::Rejected),
            other => Err(format!(
                "unknown suggestion status '{other}' (expected accepted or rejected)"
            )),
        }
    }
}

/// `suggestion_status` payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionStatusUpdate {
    pub suggestion_id: u64,
    pub status: SuggestionStatus,
}

impl OutboundMessage for SuggestionStatusUpdate {
    const KIND: &'static str = SUGGESTION_STATUS;
}

/// `request_analysis` payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestAnalysis {
    pub pr_id: u64,
}

impl OutboundMessage for RequestAnalysis {
    const KIND: &'static str = REQUEST_ANALYSIS;
}
