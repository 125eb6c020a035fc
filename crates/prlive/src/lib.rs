//! Live pull-request review events over a reconnecting WebSocket channel.
//!
//! # Crate Structure
//!
//! - [`transport`]: WebSocket transport sockets
//! - [`frame`]: JSON envelope codec and typed review messages
//! - [`channel`]: the reconnecting channel with named subscribers
//!
//! ```no_run
//! use prlive::channel::{Channel, ChannelConfig, EventName};
//!
//! # async fn demo() -> Result<(), prlive::channel::StartError> {
//! let channel = Channel::spawn(ChannelConfig::new("ws://localhost:8000/ws"))?;
//! channel.on(EventName::NewComment, |event| println!("{:?}", event.payload()));
//! channel.connect();
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use prlive_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use prlive_frame::*;
}

/// Re-export channel types.
pub mod channel {
    pub use prlive_channel::*;
}
