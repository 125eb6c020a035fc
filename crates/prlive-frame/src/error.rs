/// Errors that can occur during envelope encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame is not valid JSON.
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The frame is valid JSON but not an object.
    #[error("envelope must be a JSON object")]
    NotAnObject,

    /// The `type` field is absent or not a string.
    #[error("envelope is missing a string `type` field")]
    MissingType,

    /// The `type` field is an empty string.
    #[error("envelope `type` must not be empty")]
    EmptyType,

    /// The frame exceeds the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The envelope or payload could not be serialized.
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
