//! Envelope framing for the prlive event channel.
//!
//! Every WebSocket text frame carries exactly one envelope:
//! - `type`: a non-empty message kind (`pr_update`, `subscribe_pr`, ...)
//! - `payload`: an arbitrary JSON value, opaque to the channel
//!
//! Inbound kinds with a dedicated event live in [`kind`]; typed outbound
//! payloads live in [`payload`].

pub mod codec;
pub mod envelope;
pub mod error;
pub mod kind;
pub mod payload;

pub use codec::{decode, decode_with_config, encode, FrameConfig, DEFAULT_MAX_FRAME_SIZE};
pub use envelope::Envelope;
pub use error::{FrameError, Result};
pub use kind::{InboundKind, ServerNotice};
pub use payload::{
    NewComment, OutboundMessage, RequestAnalysis, SubscribePr, SuggestionStatus,
    SuggestionStatusUpdate, UnsubscribePr,
};
