//! Connection manager state machine.
//!
//! [`ChannelCore`] owns the transport socket and the retry state and is
//! driven one input at a time: caller commands (`connect`, `disconnect`,
//! `send`), transport events and retry timer firings. It never blocks and
//! never touches the network or the clock directly; those sit behind the
//! [`Connector`] and [`Scheduler`] seams.
//!
//! ```text
//!                 connect() / retry fires
//!   DISCONNECTED ───────────────────────────▶ CONNECTING
//!        ▲  ▲                                    │ opened
//!        │  └──────── open failed / closed ──────┤
//!        │                                       ▼
//!        └──────────────── closed ────────────  OPEN
//! ```
//!
//! `disconnect()` moves to DISCONNECTED from any state and cancels the
//! pending retry.

use std::fmt;
use std::time::Duration;

use prlive_frame::{decode_with_config, encode, Envelope, FrameConfig, OutboundMessage};
use prlive_frame::{NewComment, RequestAnalysis, SubscribePr, SuggestionStatus};
use prlive_frame::{SuggestionStatusUpdate, UnsubscribePr};
use prlive_transport::{Connector, SharedSink, Socket, SocketId, TransportEvent};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ChannelConfig;
use crate::dispatch::route;
use crate::error::ChannelError;
use crate::event::ChannelEvent;
use crate::policy::{ReconnectPolicy, RetryDecision};
use crate::registry::Subscribers;

/// Identifies one armed retry timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Arms and cancels retry timers.
///
/// When a scheduled timer elapses, the driver must call
/// [`ChannelCore::retry_elapsed`] with its id.
pub trait Scheduler: Send {
    fn schedule(&mut self, id: TimerId, delay: Duration);
    fn cancel(&mut self, id: TimerId);
}

/// Connection state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a channel's connection and retry state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStatus {
    pub state: ConnectionState,
    pub attempt_count: u32,
    pub pending_retry: bool,
}

impl Default for ChannelStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            attempt_count: 0,
            pending_retry: false,
        }
    }
}

struct ActiveSocket {
    socket: Box<dyn Socket>,
    open: bool,
}

/// The connection manager.
pub struct ChannelCore<C, S> {
    endpoint: String,
    policy: ReconnectPolicy,
    frame_config: FrameConfig,
    connector: C,
    scheduler: S,
    sink: SharedSink,
    subscribers: Subscribers,
    socket: Option<ActiveSocket>,
    pending_retry: Option<TimerId>,
    attempt_count: u32,
    next_socket_id: u64,
    next_timer_id: u64,
}

impl<C: Connector, S: Scheduler> ChannelCore<C, S> {
    /// Create a disconnected core. `sink` must route transport events back
    /// into [`ChannelCore::transport_event`].
    pub fn new(
        config: &ChannelConfig,
        connector: C,
        scheduler: S,
        sink: SharedSink,
        subscribers: Subscribers,
    ) -> Self {
        Self {
            endpoint: config.endpoint(),
            policy: config.policy(),
            frame_config: config.frame_config(),
            connector,
            scheduler,
            sink,
            subscribers,
            socket: None,
            pending_retry: None,
            attempt_count: 0,
            next_socket_id: 0,
            next_timer_id: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        match &self.socket {
            None => ConnectionState::Disconnected,
            Some(active) if active.open => ConnectionState::Open,
            Some(_) => ConnectionState::Connecting,
        }
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn has_pending_retry(&self) -> bool {
        self.pending_retry.is_some()
    }

    pub fn status(&self) -> ChannelStatus {
        ChannelStatus {
            state: self.state(),
            attempt_count: self.attempt_count,
            pending_retry: self.pending_retry.is_some(),
        }
    }

    pub fn subscribers(&self) -> &Subscribers {
        &self.subscribers
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Open a connection unless one is already open or being opened.
    ///
    /// An explicit connect supersedes any pending retry and restores the
    /// full reconnect budget.
    pub fn connect(&mut self) {
        match self.state() {
            ConnectionState::Open => {
                debug!("connect ignored: already open");
                return;
            }
            ConnectionState::Connecting => {
                debug!("connect ignored: handshake in progress");
                return;
            }
            ConnectionState::Disconnected => {}
        }

        self.cancel_retry();
        self.attempt_count = 0;
        self.open_socket();
    }

    /// Close the connection and cancel any pending retry. No reconnection
    /// follows.
    pub fn disconnect(&mut self) {
        self.cancel_retry();

        if let Some(mut active) = self.socket.take() {
            info!(socket = %active.socket.id(), "disconnecting");
            active.socket.close();
            if active.open {
                self.emit(ChannelEvent::Disconnected {
                    code: None,
                    reason: None,
                });
            }
        }
    }

    /// Write one envelope if the socket is open; otherwise emit
    /// `SendWhileClosed`. Nothing is queued.
    pub fn send(&mut self, kind: &str, payload: Value) {
        if self.state() != ConnectionState::Open {
            debug!(kind, "send while not connected");
            self.emit(ChannelEvent::Error(ChannelError::SendWhileClosed {
                kind: kind.to_string(),
            }));
            return;
        }

        let text = match encode(&Envelope::new(kind, payload)) {
            Ok(text) => text,
            Err(err) => {
                self.emit(ChannelEvent::Error(ChannelError::Encode {
                    kind: kind.to_string(),
                    reason: err.to_string(),
                }));
                return;
            }
        };

        let Some(active) = self.socket.as_mut() else {
            return;
        };
        let socket = active.socket.id();
        if let Err(err) = active.socket.send_text(text) {
            warn!(socket = %socket, kind, error = %err, "write failed");
            self.emit(ChannelEvent::Error(ChannelError::Transport(err.to_string())));
        } else {
            debug!(socket = %socket, kind, "sent");
        }
    }

    /// Send a typed outbound message.
    pub fn send_message<M: OutboundMessage>(&mut self, message: &M) {
        match Envelope::outbound(message) {
            Ok(envelope) => self.send(&envelope.kind, envelope.payload),
            Err(err) => self.emit(ChannelEvent::Error(ChannelError::Encode {
                kind: M::KIND.to_string(),
                reason: err.to_string(),
            })),
        }
    }

    pub fn subscribe_pr(&mut self, pr_id: u64) {
        self.send_message(&SubscribePr { pr_id });
    }

    pub fn unsubscribe_pr(&mut self, pr_id: u64) {
        self.send_message(&UnsubscribePr { pr_id });
    }

    pub fn post_comment(&mut self, pr_id: u64, comment: impl Into<String>, line_number: Option<u32>) {
        self.send_message(&NewComment {
            pr_id,
            comment: comment.into(),
            line_number,
        });
    }

    pub fn set_suggestion_status(&mut self, suggestion_id: u64, status: SuggestionStatus) {
        self.send_message(&SuggestionStatusUpdate {
            suggestion_id,
            status,
        });
    }

    pub fn request_analysis(&mut self, pr_id: u64) {
        self.send_message(&RequestAnalysis { pr_id });
    }

    /// Feed one transport event. Events from sockets other than the current
    /// one are stale and ignored.
    pub fn transport_event(&mut self, socket: SocketId, event: TransportEvent) {
        let Some(active) = self.socket.as_mut().filter(|a| a.socket.id() == socket) else {
            debug!(socket = %socket, ?event, "ignoring event from retired socket");
            return;
        };

        match event {
            TransportEvent::Opened => {
                active.open = true;
                info!(socket = %socket, "connected");
                self.attempt_count = 0;
                self.cancel_retry();
                self.emit(ChannelEvent::Connected);
            }
            TransportEvent::Text(text) => {
                match decode_with_config(&text, &self.frame_config) {
                    Ok(envelope) => {
                        debug!(socket = %socket, kind = %envelope.kind, "received");
                        self.emit(route(envelope));
                    }
                    Err(err) => {
                        warn!(socket = %socket, error = %err, "dropping malformed frame");
                        self.emit(ChannelEvent::Error(ChannelError::Decode(err.to_string())));
                    }
                }
            }
            TransportEvent::Error(message) => {
                warn!(socket = %socket, error = %message, "transport error");
                self.emit(ChannelEvent::Error(ChannelError::Transport(message)));
            }
            TransportEvent::Closed { code, reason } => {
                self.socket = None;
                info!(socket = %socket, ?code, ?reason, "connection closed");
                self.emit(ChannelEvent::Disconnected { code, reason });
                self.schedule_reconnect();
            }
        }
    }

    /// A retry timer elapsed. Timers other than the pending one are stale.
    pub fn retry_elapsed(&mut self, timer: TimerId) {
        if self.pending_retry != Some(timer) {
            debug!(timer = timer.0, "ignoring stale retry timer");
            return;
        }
        self.pending_retry = None;
        if self.socket.is_some() {
            return;
        }

        info!(
            attempt = self.attempt_count,
            max_attempts = self.policy.max_attempts(),
            "reconnecting"
        );
        self.open_socket();
    }

    fn open_socket(&mut self) {
        self.next_socket_id += 1;
        let id = SocketId(self.next_socket_id);

        match self.connector.open(&self.endpoint, id, self.sink.clone()) {
            Ok(socket) => {
                debug!(socket = %id, "connecting");
                self.socket = Some(ActiveSocket {
                    socket,
                    open: false,
                });
            }
            Err(err) => {
                warn!(socket = %id, error = %err, "failed to open transport");
                self.emit(ChannelEvent::Error(ChannelError::TransportOpen(err.to_string())));
                self.schedule_reconnect();
            }
        }
    }

    fn schedule_reconnect(&mut self) {
        self.cancel_retry();

        match self.policy.decide(self.attempt_count) {
            RetryDecision::Retry { delay, attempt } => {
                self.attempt_count = attempt;
                self.next_timer_id += 1;
                let timer = TimerId(self.next_timer_id);
                self.scheduler.schedule(timer, delay);
                self.pending_retry = Some(timer);
                info!(
                    attempt,
                    max_attempts = self.policy.max_attempts(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "reconnect scheduled"
                );
            }
            RetryDecision::Exhausted => {
                let attempts = self.policy.max_attempts();
                warn!(attempts, "reconnect attempts exhausted");
                self.emit(ChannelEvent::Error(ChannelError::ReconnectExhausted { attempts }));
            }
        }
    }

    fn cancel_retry(&mut self) {
        if let Some(timer) = self.pending_retry.take() {
            self.scheduler.cancel(timer);
        }
    }

    fn emit(&self, event: ChannelEvent) {
        self.subscribers.emit(&event);
    }
}
