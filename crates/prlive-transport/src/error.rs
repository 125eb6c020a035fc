/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The address could not be turned into a WebSocket handshake request.
    /// `url` never includes the query string.
    #[error("invalid websocket url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Opening requires a running tokio runtime.
    #[error("no tokio runtime available to drive the socket")]
    NoRuntime,

    /// The socket is closed (or closing) and accepts no more writes.
    #[error("socket {0} is closed")]
    Closed(crate::traits::SocketId),
}

pub type Result<T> = std::result::Result<T, TransportError>;
