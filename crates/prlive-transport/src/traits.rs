use std::fmt;
use std::sync::Arc;

use tokio_util::task::TaskTracker;

use crate::error::Result;

/// Identifies one transport socket (one connection attempt).
///
/// Ids are assigned by the owner of the connector and never reused, so an
/// event tagged with a retired id can always be recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(pub u64);

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that happened on a transport socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The handshake completed; the socket accepts writes.
    Opened,
    /// A complete inbound text frame.
    Text(String),
    /// A non-terminal error. A `Closed` event follows if the socket is done.
    Error(String),
    /// The socket is gone. Terminal: no further events for this id.
    Closed {
        code: Option<u16>,
        reason: Option<String>,
    },
}

/// Receives transport events. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn deliver(&self, socket: SocketId, event: TransportEvent);
}

/// Shared handle to an event sink.
pub type SharedSink = Arc<dyn EventSink>;

/// A live transport socket handle.
///
/// Dropping the handle closes the socket.
pub trait Socket: Send {
    /// The id this socket was opened with.
    fn id(&self) -> SocketId;

    /// Queue a text frame for writing.
    fn send_text(&mut self, text: String) -> Result<()>;

    /// Close the socket. If the handshake is still in flight, the connection
    /// is closed as soon as it completes and `Opened` is never delivered.
    fn close(&mut self);
}

/// Opens transport sockets.
pub trait Connector: Send {
    /// Start opening a socket to `url`.
    ///
    /// Returns immediately. An `Err` means the attempt failed synchronously
    /// and no events will be delivered for `id`. On `Ok`, exactly one
    /// terminal `Closed` event is eventually delivered unless the socket is
    /// closed through its handle first.
    fn open(&mut self, url: &str, id: SocketId, sink: SharedSink) -> Result<Box<dyn Socket>>;

    /// Tracker for background tasks spawned by this connector, if any.
    fn tasks(&self) -> Option<TaskTracker> {
        None
    }
}
