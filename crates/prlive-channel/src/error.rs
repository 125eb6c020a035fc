use std::path::PathBuf;

/// Failures surfaced to subscribers as `error` events.
///
/// None of these is fatal: the channel keeps running and the subscriber
/// decides what to show.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// Creating the transport socket failed synchronously. Drives reconnection.
    #[error("failed to open transport: {0}")]
    TransportOpen(String),

    /// The transport reported an error. The close that follows drives reconnection.
    #[error("transport error: {0}")]
    Transport(String),

    /// An inbound frame was not a valid envelope and was dropped.
    #[error("dropped malformed frame: {0}")]
    Decode(String),

    /// An outbound message could not be serialized.
    #[error("failed to encode '{kind}': {reason}")]
    Encode { kind: String, reason: String },

    /// A send was attempted while no socket was open. Nothing was written.
    #[error("cannot send '{kind}': channel is not connected")]
    SendWhileClosed { kind: String },

    /// The reconnect budget is spent; the channel stays disconnected until
    /// `connect()` is called again.
    #[error("gave up reconnecting after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },
}

/// Errors in channel configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No connection address was supplied.
    #[error("missing url")]
    MissingUrl,

    /// The address is not a `ws://` or `wss://` URL.
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A numeric option is out of range.
    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors starting a channel.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Channels run on a tokio runtime; none was current.
    #[error("no tokio runtime is available to run the channel")]
    NoRuntime,
}
