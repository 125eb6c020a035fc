use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::{Connector, SharedSink, Socket, SocketId, TransportEvent};

/// WebSocket connector backed by `tokio-tungstenite`.
///
/// Each opened socket is driven by its own task on the current tokio
/// runtime. Tasks are tracked so a caller can wait for pending closes to
/// flush before the process exits.
#[derive(Debug, Clone, Default)]
pub struct WsConnector {
    tasks: TaskTracker,
}

impl WsConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Connector for WsConnector {
    fn open(&mut self, url: &str, id: SocketId, sink: SharedSink) -> Result<Box<dyn Socket>> {
        let request = url
            .into_client_request()
            .map_err(|err| TransportError::InvalidUrl {
                url: without_query(url).to_string(),
                reason: err.to_string(),
            })?;
        match request.uri().scheme_str() {
            Some("ws") | Some("wss") => {}
            other => {
                return Err(TransportError::InvalidUrl {
                    url: without_query(url).to_string(),
                    reason: format!("unsupported scheme {other:?}"),
                })
            }
        }
        let runtime = Handle::try_current().map_err(|_| TransportError::NoRuntime)?;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        // The query string may carry credentials; log only the host and path.
        debug!(
            socket = %id,
            host = ?request.uri().host(),
            path = request.uri().path(),
            "opening websocket"
        );
        self.tasks.spawn_on(
            drive(request, id, sink, outbound_rx, cancel.clone()),
            &runtime,
        );

        Ok(Box::new(WsSocket {
            id,
            outbound: outbound_tx,
            cancel,
        }))
    }

    fn tasks(&self) -> Option<TaskTracker> {
        Some(self.tasks.clone())
    }
}

/// The address without its query or fragment, which may carry credentials.
fn without_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or_default()
}

/// Handle to a socket driven by [`WsConnector`].
#[derive(Debug)]
pub struct WsSocket {
    id: SocketId,
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl Socket for WsSocket {
    fn id(&self) -> SocketId {
        self.id
    }

    fn send_text(&mut self, text: String) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(TransportError::Closed(self.id));
        }
        self.outbound
            .send(text)
            .map_err(|_| TransportError::Closed(self.id))
    }

    fn close(&mut self) {
        self.cancel.cancel();
    }
}

impl Drop for WsSocket {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn drive(
    request: Request,
    id: SocketId,
    sink: SharedSink,
    mut outbound: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) {
    let connected = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            debug!(socket = %id, "closed before handshake completed");
            return;
        }
        result = connect_async(request) => result,
    };

    let mut stream = match connected {
        Ok((stream, _response)) => stream,
        Err(err) => {
            warn!(socket = %id, error = %err, "websocket handshake failed");
            sink.deliver(id, TransportEvent::Error(err.to_string()));
            sink.deliver(
                id,
                TransportEvent::Closed {
                    code: None,
                    reason: None,
                },
            );
            return;
        }
    };

    if cancel.is_cancelled() {
        debug!(socket = %id, "handshake completed after close; dropping connection");
        let _ = stream.close(None).await;
        return;
    }

    info!(socket = %id, "websocket open");
    sink.deliver(id, TransportEvent::Opened);

    let (mut write, mut read) = stream.split();
    loop {
        tokio::select! {
            biased;
            Some(text) = outbound.recv() => {
                if let Err(err) = write.send(Message::text(text)).await {
                    warn!(socket = %id, error = %err, "websocket write failed");
                    sink.deliver(id, TransportEvent::Error(err.to_string()));
                    sink.deliver(id, TransportEvent::Closed { code: None, reason: None });
                    return;
                }
            }
            () = cancel.cancelled() => {
                // Frames queued before the close request still go out.
                while let Ok(text) = outbound.try_recv() {
                    if write.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
                let _ = write.close().await;
                debug!(socket = %id, "websocket closed locally");
                return;
            }
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    sink.deliver(id, TransportEvent::Text(text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = match frame {
                        Some(frame) => (
                            Some(u16::from(frame.code)),
                            Some(frame.reason.as_str().to_owned()).filter(|r| !r.is_empty()),
                        ),
                        None => (None, None),
                    };
                    info!(socket = %id, ?code, ?reason, "websocket closed by peer");
                    // Sends the queued close reply.
                    let _ = write.flush().await;
                    sink.deliver(id, TransportEvent::Closed { code, reason });
                    return;
                }
                Some(Ok(Message::Binary(data))) => {
                    debug!(socket = %id, size = data.len(), "ignoring binary frame");
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(socket = %id, error = %err, "websocket read failed");
                    sink.deliver(id, TransportEvent::Error(err.to_string()));
                    sink.deliver(id, TransportEvent::Closed { code: None, reason: None });
                    return;
                }
                None => {
                    info!(socket = %id, "websocket stream ended");
                    sink.deliver(id, TransportEvent::Closed { code: None, reason: None });
                    return;
                }
            }
        }
    }
}
