//! The async channel handle.
//!
//! [`Channel`] is a cheap, cloneable handle to a background task that owns a
//! [`ChannelCore`]. Every input (caller commands, transport events, retry
//! timers) goes through one mailbox, so the core sees them strictly in order
//! and subscriber handlers run on that task one at a time.

use std::collections::HashMap;
use std::time::Duration;

use prlive_frame::SuggestionStatus;
use prlive_transport::{Connector, EventSink, SocketId, TransportEvent, WsConnector};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::sync::{oneshot, watch};
use tokio::task::AbortHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::config::ChannelConfig;
use crate::manager::{ChannelCore, ChannelStatus, ConnectionState, Scheduler, TimerId};
use crate::error::StartError;
use crate::event::{ChannelEvent, EventName};
use crate::registry::{Subscribers, SubscriptionId};

enum Command {
    Connect,
    Disconnect,
    Send { kind: String, payload: Value },
    SubscribePr(u64),
    UnsubscribePr(u64),
    PostComment {
        pr_id: u64,
        comment: String,
        line_number: Option<u32>,
    },
    SetSuggestionStatus {
        suggestion_id: u64,
        status: SuggestionStatus,
    },
    RequestAnalysis(u64),
    Transport(SocketId, TransportEvent),
    RetryElapsed(TimerId),
    Shutdown(oneshot::Sender<Option<TaskTracker>>),
}

/// Routes transport events into the mailbox. Holds a weak sender so the
/// actor stops once every [`Channel`] handle is gone.
struct MailboxSink {
    mailbox: WeakUnboundedSender<Command>,
}

impl EventSink for MailboxSink {
    fn deliver(&self, socket: SocketId, event: TransportEvent) {
        if let Some(mailbox) = self.mailbox.upgrade() {
            let _ = mailbox.send(Command::Transport(socket, event));
        }
    }
}

/// Retry timers as sleeping tasks that post back into the mailbox.
struct TokioScheduler {
    mailbox: WeakUnboundedSender<Command>,
    timers: HashMap<TimerId, AbortHandle>,
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        // The core keeps at most one retry armed, so anything left has fired.
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }

        let mailbox = self.mailbox.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(mailbox) = mailbox.upgrade() {
                let _ = mailbox.send(Command::RetryElapsed(id));
            }
        });
        self.timers.insert(id, task.abort_handle());
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(timer) = self.timers.remove(&id) {
            timer.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for timer in self.timers.values() {
            timer.abort();
        }
    }
}

/// Handle to a running event channel.
///
/// Commands are asynchronous: they are queued to the channel task and the
/// outcome is reported to subscribers. [`Channel::status`] reflects the
/// state after the last processed input.
///
/// The channel task ends after [`Channel::shutdown`], or when every handle
/// has been dropped.
#[derive(Clone)]
pub struct Channel {
    mailbox: UnboundedSender<Command>,
    subscribers: Subscribers,
    status: watch::Receiver<ChannelStatus>,
}

impl Channel {
    /// Start a channel over WebSocket. Must be called within a tokio runtime.
    ///
    /// The channel starts disconnected; call [`Channel::connect`].
    pub fn spawn(config: ChannelConfig) -> Result<Self, StartError> {
        Self::spawn_with(config, WsConnector::new())
    }

    /// Start a channel over a custom transport.
    pub fn spawn_with<C>(config: ChannelConfig, connector: C) -> Result<Self, StartError>
    where
        C: Connector + 'static,
    {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| StartError::NoRuntime)?;

        let (mailbox, inbox) = mpsc::unbounded_channel();
        let subscribers = Subscribers::new();
        let scheduler = TokioScheduler {
            mailbox: mailbox.downgrade(),
            timers: HashMap::new(),
        };
        let sink = std::sync::Arc::new(MailboxSink {
            mailbox: mailbox.downgrade(),
        });
        let core = ChannelCore::new(&config, connector, scheduler, sink, subscribers.clone());
        let (status_tx, status) = watch::channel(core.status());

        debug!(?config, "starting channel");
        runtime.spawn(run(core, inbox, status_tx));

        Ok(Self {
            mailbox,
            subscribers,
            status,
        })
    }

    /// Open a connection. No-op while already open or connecting.
    pub fn connect(&self) {
        self.post(Command::Connect);
    }

    /// Close the connection and cancel any pending reconnect.
    pub fn disconnect(&self) {
        self.post(Command::Disconnect);
    }

    /// Send an arbitrary envelope. Fails with an `error` event when not open.
    pub fn send(&self, kind: impl Into<String>, payload: Value) {
        self.post(Command::Send {
            kind: kind.into(),
            payload,
        });
    }

    pub fn subscribe_pr(&self, pr_id: u64) {
        self.post(Command::SubscribePr(pr_id));
    }

    pub fn unsubscribe_pr(&self, pr_id: u64) {
        self.post(Command::UnsubscribePr(pr_id));
    }

    pub fn post_comment(&self, pr_id: u64, comment: impl Into<String>, line_number: Option<u32>) {
        self.post(Command::PostComment {
            pr_id,
            comment: comment.into(),
            line_number,
        });
    }

    pub fn set_suggestion_status(&self, suggestion_id: u64, status: SuggestionStatus) {
        self.post(Command::SetSuggestionStatus {
            suggestion_id,
            status,
        });
    }

    pub fn request_analysis(&self, pr_id: u64) {
        self.post(Command::RequestAnalysis(pr_id));
    }

    /// Register a handler. Handlers run on the channel task.
    pub fn on<F>(&self, name: EventName, handler: F) -> SubscriptionId
    where
        F: Fn(&ChannelEvent) + Send + Sync + 'static,
    {
        self.subscribers.on(name, handler)
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        self.subscribers.off(id)
    }

    pub fn subscribers(&self) -> &Subscribers {
        &self.subscribers
    }

    pub fn status(&self) -> ChannelStatus {
        *self.status.borrow()
    }

    pub fn state(&self) -> ConnectionState {
        self.status().state
    }

    pub fn attempt_count(&self) -> u32 {
        self.status().attempt_count
    }

    pub fn has_pending_retry(&self) -> bool {
        self.status().pending_retry
    }

    /// Watch status changes.
    pub fn status_watch(&self) -> watch::Receiver<ChannelStatus> {
        self.status.clone()
    }

    /// Disconnect, stop the channel task and wait for queued frames to be
    /// flushed. Commands sent after this are dropped.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.mailbox.send(Command::Shutdown(ack)).is_err() {
            return;
        }
        if let Ok(Some(tasks)) = done.await {
            tasks.close();
            tasks.wait().await;
        }
    }

    fn post(&self, command: Command) {
        if self.mailbox.send(command).is_err() {
            debug!("channel task has stopped; dropping command");
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("status", &self.status())
            .field("subscribers", &self.subscribers)
            .finish()
    }
}

async fn run<C: Connector>(
    mut core: ChannelCore<C, TokioScheduler>,
    mut inbox: UnboundedReceiver<Command>,
    status: watch::Sender<ChannelStatus>,
) {
    while let Some(command) = inbox.recv().await {
        match command {
            Command::Connect => core.connect(),
            Command::Disconnect => core.disconnect(),
            Command::Send { kind, payload } => core.send(&kind, payload),
            Command::SubscribePr(pr_id) => core.subscribe_pr(pr_id),
            Command::UnsubscribePr(pr_id) => core.unsubscribe_pr(pr_id),
            Command::PostComment {
                pr_id,
                comment,
                line_number,
            } => core.post_comment(pr_id, comment, line_number),
            Command::SetSuggestionStatus {
                suggestion_id,
                status,
            } => core.set_suggestion_status(suggestion_id, status),
            Command::RequestAnalysis(pr_id) => core.request_analysis(pr_id),
            Command::Transport(socket, event) => core.transport_event(socket, event),
            Command::RetryElapsed(timer) => core.retry_elapsed(timer),
            Command::Shutdown(ack) => {
                core.disconnect();
                status.send_replace(core.status());
                info!("channel shut down");
                let _ = ack.send(core.connector().tasks());
                return;
            }
        }
        status.send_replace(core.status());
    }

    debug!("all channel handles dropped");
    core.disconnect();
    status.send_replace(core.status());
}
