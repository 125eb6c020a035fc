//! Reconnecting event channel for live pull-request review.
//!
//! One connection per [`Channel`]: open it, keep it open across drops with a
//! bounded fixed-interval retry, send typed review messages, and fan inbound
//! envelopes out to named subscribers.

pub mod channel;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod manager;
pub mod policy;
pub mod registry;

#[cfg(test)]
mod testing;

pub use channel::Channel;
pub use config::{ChannelConfig, DEFAULT_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL};
pub use dispatch::route;
pub use error::{ChannelError, ConfigError, StartError};
pub use event::{ChannelEvent, EventName};
pub use manager::{ChannelCore, ChannelStatus, ConnectionState, Scheduler, TimerId};
pub use policy::{ReconnectPolicy, RetryDecision};
pub use registry::{Handler, Subscribers, SubscriptionId};
