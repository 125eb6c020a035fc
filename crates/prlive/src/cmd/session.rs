//! Shared connection handling for CLI commands.

use std::time::Duration;

use prlive_channel::{Channel, ChannelError, ChannelEvent, EventName};
use prlive_frame::ServerNotice;
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::cmd::ConnectArgs;
use crate::exit::{channel_error, start_error, CliError, CliResult, FAILURE, TIMEOUT};
use crate::output::{print_event, OutputFormat};

/// An open channel plus every event it has emitted, in order.
pub struct Session {
    pub channel: Channel,
    pub events: UnboundedReceiver<ChannelEvent>,
}

impl Session {
    /// Start a channel and wait for the first successful connection.
    pub async fn open(args: &ConnectArgs) -> CliResult<Self> {
        let config = args.channel_config()?;
        let connect_timeout = args.connect_timeout()?;

        let channel = Channel::spawn(config).map_err(|err| start_error("start failed", err))?;
        let events = forward_events(&channel);
        let mut session = Self { channel, events };

        session.channel.connect();
        let connected = timeout(connect_timeout, session.wait_connected()).await;
        match connected {
            Ok(Ok(())) => {
                info!("connected");
                Ok(session)
            }
            Ok(Err(err)) => {
                session.close().await;
                Err(err)
            }
            Err(_) => {
                session.close().await;
                Err(CliError::new(
                    TIMEOUT,
                    format!("connect failed: no connection within {connect_timeout:?}"),
                ))
            }
        }
    }

    async fn wait_connected(&mut self) -> CliResult<()> {
        while let Some(event) = self.events.recv().await {
            match event {
                ChannelEvent::Connected => return Ok(()),
                ChannelEvent::Error(err @ ChannelError::ReconnectExhausted { .. }) => {
                    return Err(channel_error("connect failed", &err));
                }
                other => debug!(event = %other.name(), "while connecting"),
            }
        }
        Err(CliError::new(
            crate::exit::INTERNAL,
            "connect failed: channel stopped",
        ))
    }

    /// After a one-shot send: optionally wait for a reply, then flush and
    /// close. Fails if the channel reported an error for the send, or if the
    /// awaited reply is a server error notice.
    pub async fn finish(mut self, wait: Option<Duration>, format: OutputFormat) -> CliResult<i32> {
        if let Some(wait_timeout) = wait {
            let outcome = timeout(wait_timeout, self.next_reply()).await;
            match outcome {
                Ok(Ok(event)) => {
                    print_event(&event, format);
                    if let Some(message) = server_rejection(&event) {
                        self.close().await;
                        return Err(CliError::new(FAILURE, message));
                    }
                }
                Ok(Err(err)) => {
                    self.close().await;
                    return Err(err);
                }
                Err(_) => {
                    self.close().await;
                    return Err(CliError::new(
                        TIMEOUT,
                        format!("no reply within {wait_timeout:?}"),
                    ));
                }
            }
        }

        self.close().await;
        while let Ok(event) = self.events.try_recv() {
            if let ChannelEvent::Error(
                err @ (ChannelError::SendWhileClosed { .. }
                | ChannelError::Encode { .. }
                | ChannelError::Transport(_)),
            ) = event
            {
                return Err(channel_error("send failed", &err));
            }
        }
        Ok(crate::exit::SUCCESS)
    }

    /// The next server-originated event. Errors end the wait.
    async fn next_reply(&mut self) -> CliResult<ChannelEvent> {
        while let Some(event) = self.events.recv().await {
            match &event {
                ChannelEvent::Error(err) => return Err(channel_error("waiting for reply", err)),
                ChannelEvent::Connected | ChannelEvent::Disconnected { .. } => continue,
                _ => return Ok(event),
            }
        }
        Err(CliError::new(
            crate::exit::INTERNAL,
            "waiting for reply: channel stopped",
        ))
    }

    pub async fn close(&self) {
        self.channel.shutdown().await;
    }
}

fn forward_events(channel: &Channel) -> UnboundedReceiver<ChannelEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    for name in EventName::ALL {
        let tx = tx.clone();
        channel.on(name, move |event| {
            let _ = tx.send(event.clone());
        });
    }
    rx
}

/// The failure text for a reply that reports a server-side error.
fn server_rejection(event: &ChannelEvent) -> Option<String> {
    let ChannelEvent::Message(envelope) = event else {
        return None;
    };
    let field = match ServerNotice::from_type(&envelope.kind)? {
        ServerNotice::Error => "message",
        ServerNotice::AnalysisError => "error",
        _ => return None,
    };
    let detail = match envelope.payload.get(field) {
        Some(Value::String(text)) => text.clone(),
        _ => envelope.payload.to_string(),
    };
    Some(format!("server reported {}: {detail}", envelope.kind))
}
