use serde_json::Value;
use tracing::trace;

use crate::envelope::Envelope;
use crate::error::{FrameError, Result};

/// Default maximum inbound frame size: 1 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Configuration for the envelope codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum inbound frame size in bytes. Default: 1 MiB.
    pub max_frame_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Encode an envelope into a single text frame.
///
/// Wire format:
/// ```text
/// {"type": "<kind>", "payload": <json value>}
/// ```
///
/// An empty kind is rejected with [`FrameError::EmptyType`], the same error
/// `decode` reports for it.
pub fn encode(envelope: &Envelope) -> Result<String> {
    if envelope.kind.is_empty() {
        return Err(FrameError::EmptyType);
    }
    serde_json::to_string(envelope).map_err(FrameError::Encode)
}

/// Decode a text frame using the default configuration.
pub fn decode(text: &str) -> Result<Envelope> {
    decode_with_config(text, &FrameConfig::default())
}

/// Decode a text frame into an envelope.
///
/// A missing `payload` decodes as `null`; unknown top-level fields are ignored.
pub fn decode_with_config(text: &str, config: &FrameConfig) -> Result<Envelope> {
    if text.len() > config.max_frame_size {
        return Err(FrameError::FrameTooLarge {
            size: text.len(),
            max: config.max_frame_size,
        });
    }

    let value: Value = serde_json::from_str(text).map_err(FrameError::Malformed)?;
    let Value::Object(mut fields) = value else {
        return Err(FrameError::NotAnObject);
    };

    let kind = match fields.remove("type") {
        Some(Value::String(kind)) => kind,
        _ => return Err(FrameError::MissingType),
    };
    if kind.is_empty() {
        return Err(FrameError::EmptyType);
    }

    let payload = fields.remove("payload").unwrap_or(Value::Null);
    trace!(kind = %kind, size = text.len(), "decoded envelope");

    Ok(Envelope { kind, payload })
}
