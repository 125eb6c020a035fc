//! Transport sockets for the prlive event channel.
//!
//! A transport socket is one physical duplex connection for one connection
//! attempt. It is opened through a [`Connector`], written through the
//! [`Socket`] handle, and reports everything else (open, inbound text,
//! errors, close) asynchronously to an [`EventSink`].
//!
//! This is the lowest layer of prlive. The channel crate owns reconnection
//! and never talks to the network directly.

pub mod error;
pub mod traits;
pub mod ws;

pub use error::{Result, TransportError};
pub use traits::{Connector, EventSink, SharedSink, Socket, SocketId, TransportEvent};
pub use ws::{WsConnector, WsSocket};
