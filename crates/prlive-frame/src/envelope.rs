use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{FrameError, Result};
use crate::payload::OutboundMessage;

/// One message on the wire: a kind tag plus an opaque JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Message kind, serialized as `type`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Message payload. `null` when the sender omitted it.
    pub payload: Value,
}

impl Envelope {
    /// Create an envelope from a kind and a payload.
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Build the envelope for a typed outbound message.
    pub fn outbound<M: OutboundMessage>(message: &M) -> Result<Self> {
        let payload = serde_json::to_value(message).map_err(FrameError::Encode)?;
        Ok(Self::new(M::KIND, payload))
    }

    /// Deserialize the payload into a concrete type.
    pub fn payload_as<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}
