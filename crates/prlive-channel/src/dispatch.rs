//! Maps decoded inbound envelopes to subscriber events.

use prlive_frame::{Envelope, InboundKind};

use crate::event::ChannelEvent;

/// Turn an inbound envelope into the single event it is published as.
///
/// Kinds in the fixed table get their dedicated event with the payload;
/// everything else becomes a generic `message` carrying the whole envelope.
pub fn route(envelope: Envelope) -> ChannelEvent {
    match InboundKind::from_type(&envelope.kind) {
        Some(InboundKind::PrUpdate) => ChannelEvent::PrUpdate(envelope.payload),
        Some(InboundKind::NewSuggestion) => ChannelEvent::NewSuggestion(envelope.payload),
        Some(InboundKind::NewComment) => ChannelEvent::NewComment(envelope.payload),
        Some(InboundKind::SuggestionStatusChange) => {
            ChannelEvent::SuggestionStatusChange(envelope.payload)
        }
        None => ChannelEvent::Message(envelope),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::event::EventName;

    #[test]
    fn table_kinds_get_dedicated_events() {
        let cases = [
            ("pr_update", EventName::PrUpdate),
            ("new_suggestion", EventName::NewSuggestion),
            ("new_comment", EventName::NewComment),
            ("suggestion_status_change", EventName::SuggestionStatusChange),
        ];
        for (kind, expected) in cases {
            let event = route(Envelope::new(kind, json!({ "prId": 1 })));
            assert_eq!(event.name(), expected, "kind {kind}");
            assert_eq!(event.wire_type(), Some(kind));
            assert_eq!(event.payload(), Some(&json!({ "prId": 1 })));
        }
    }

    #[test]
    fn unknown_kind_becomes_message_with_envelope() {
        let envelope = Envelope::new("analysis_complete", json!({ "analysis_id": 4 }));
        assert_eq!(route(envelope.clone()), ChannelEvent::Message(envelope));
    }
}
