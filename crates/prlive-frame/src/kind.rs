//! Message kinds carried in the envelope `type` field.
//!
//! Inbound kinds with a dedicated event are listed in [`InboundKind`]. Any
//! other inbound kind is still valid and reaches subscribers as a generic
//! message, so the server can add kinds without breaking clients.

/// Inbound: pull request metadata changed.
pub const PR_UPDATE: &str = "pr_update";
/// Inbound: the analysis pipeline produced a suggestion.
pub const NEW_SUGGESTION: &str = "new_suggestion";
/// Inbound: a comment was added. Also used outbound to post a comment.
pub const NEW_COMMENT: &str = "new_comment";
/// Inbound: a suggestion was accepted or rejected.
pub const SUGGESTION_STATUS_CHANGE: &str = "suggestion_status_change";

/// Outbound: start receiving events for a pull request.
pub const SUBSCRIBE_PR: &str = "subscribe_pr";
/// Outbound: stop receiving events for a pull request.
pub const UNSUBSCRIBE_PR: &str = "unsubscribe_pr";
/// Outbound: accept or reject a suggestion.
pub const SUGGESTION_STATUS: &str = "suggestion_status";
/// Outbound: ask the server to (re)analyze a pull request.
pub const REQUEST_ANALYSIS: &str = "request_analysis";

/// Inbound kinds that map to a dedicated event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundKind {
    PrUpdate,
    NewSuggestion,
    NewComment,
    SuggestionStatusChange,
}

impl InboundKind {
    /// All inbound kinds, in table order.
    pub const ALL: [InboundKind; 4] = [
        InboundKind::PrUpdate,
        InboundKind::NewSuggestion,
        InboundKind::NewComment,
        InboundKind::SuggestionStatusChange,
    ];

    /// Look up a wire `type`. Returns `None` for kinds without a dedicated event.
    pub fn from_type(kind: &str) -> Option<Self> {
        match kind {
            PR_UPDATE => Some(Self::PrUpdate),
            NEW_SUGGESTION => Some(Self::NewSuggestion),
            NEW_COMMENT => Some(Self::NewComment),
            SUGGESTION_STATUS_CHANGE => Some(Self::SuggestionStatusChange),
            _ => None,
        }
    }

    /// The wire `type` for this kind.
    pub fn as_type(self) -> &'static str {
        match self {
            Self::PrUpdate => PR_UPDATE,
            Self::NewSuggestion => NEW_SUGGESTION,
            Self::NewComment => NEW_COMMENT,
            Self::SuggestionStatusChange => SUGGESTION_STATUS_CHANGE,
        }
    }
}

/// Acknowledgements and notices the review server pushes besides the
/// dedicated event kinds. These arrive as generic messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerNotice {
    /// `subscribed {pr_id}`: a `subscribe_pr` was accepted.
    Subscribed,
    /// `unsubscribed {pr_id}`: an `unsubscribe_pr` was accepted.
    Unsubscribed,
    /// `comment_added`: a comment was broadcast to PR subscribers.
    CommentAdded,
    /// `suggestion_updated`: a suggestion status was broadcast.
    SuggestionUpdated,
    /// `analysis_complete {analysis_id, pr_id, completed_at}`.
    AnalysisComplete,
    /// `analysis_error {analysis_id, pr_id, error}`.
    AnalysisError,
    /// `error {message}`: the server rejected the last message.
    Error,
}

impl ServerNotice {
    pub fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "subscribed" => Some(Self::Subscribed),
            "unsubscribed" => Some(Self::Unsubscribed),
            "comment_added" => Some(Self::CommentAdded),
            "suggestion_updated" => Some(Self::SuggestionUpdated),
            "analysis_complete" => Some(Self::AnalysisComplete),
            "analysis_error" => Some(Self::AnalysisError),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}
