//! Channel behaviour against a real local WebSocket server.

use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use prlive_channel::{Channel, ChannelConfig, ChannelEvent, ConnectionState, EventName};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

const TIMEOUT: Duration = Duration::from_secs(5);

fn forward(channel: &Channel) -> mpsc::UnboundedReceiver<ChannelEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    for name in EventName::ALL {
        let tx = tx.clone();
        channel.on(name, move |event| {
            let _ = tx.send(event.clone());
        });
    }
    rx
}

async fn next(events: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    timeout(TIMEOUT, events.recv())
        .await
        .expect("event should arrive in time")
        .expect("channel should stay alive")
}

async fn next_text<S>(ws: &mut S) -> String
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return text.as_str().to_owned(),
            Some(Ok(_)) => continue,
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn resubscribes_and_recovers_after_server_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut received = Vec::new();

        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        received.push(next_text(&mut ws).await);
        ws.send(Message::text(
            r#"{"type":"new_comment","payload":{"prId":7,"comment":"nit: rename"}}"#,
        ))
        .await
        .unwrap();
        ws.close(Some(CloseFrame {
            code: CloseCode::Away,
            reason: "restarting".into(),
        }))
        .await
        .unwrap();
        drop(ws);

        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        received.push(next_text(&mut ws).await);
        ws.send(Message::text(
            r#"{"type":"subscribed","payload":{"pr_id":7}}"#,
        ))
        .await
        .unwrap();
        received.push(next_text(&mut ws).await);
        while let Some(Ok(message)) = ws.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
        received
    });

    let config = ChannelConfig {
        reconnect_attempts: 3,
        reconnect_interval: Duration::from_millis(50),
        ..ChannelConfig::new(format!("ws://{addr}/ws"))
    };
    let channel = Channel::spawn(config).unwrap();
    let mut events = forward(&channel);

    let resubscriber = channel.clone();
    let subscription = channel.on(EventName::Connected, move |_| resubscriber.subscribe_pr(7));

    channel.connect();
    assert_eq!(next(&mut events).await, ChannelEvent::Connected);
    assert_eq!(
        next(&mut events).await,
        ChannelEvent::NewComment(json!({ "prId": 7, "comment": "nit: rename" }))
    );
    assert_eq!(
        next(&mut events).await,
        ChannelEvent::Disconnected {
            code: Some(1001),
            reason: Some("restarting".to_string()),
        }
    );

    assert_eq!(next(&mut events).await, ChannelEvent::Connected);
    match next(&mut events).await {
        ChannelEvent::Message(envelope) => {
            assert_eq!(envelope.kind, "subscribed");
            assert_eq!(envelope.payload, json!({ "pr_id": 7 }));
        }
        other => panic!("expected a generic message, got {other:?}"),
    }

    channel.request_analysis(7);
    assert!(channel.off(subscription));
    channel.shutdown().await;
    assert_eq!(channel.state(), ConnectionState::Disconnected);

    let received = timeout(TIMEOUT, server).await.unwrap().unwrap();
    assert_eq!(
        received,
        vec![
            r#"{"type":"subscribe_pr","payload":{"prId":7}}"#.to_string(),
            r#"{"type":"subscribe_pr","payload":{"prId":7}}"#.to_string(),
            r#"{"type":"request_analysis","payload":{"prId":7}}"#.to_string(),
        ]
    );
}

#[tokio::test]
async fn unreachable_server_exhausts_retries() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let config = ChannelConfig {
        reconnect_attempts: 1,
        reconnect_interval: Duration::from_millis(20),
        ..ChannelConfig::new(format!("ws://{addr}/ws"))
    };
    let channel = Channel::spawn(config).unwrap();
    let mut events = forward(&channel);
    channel.connect();

    let mut disconnects = 0;
    loop {
        match next(&mut events).await {
            ChannelEvent::Disconnected { .. } => disconnects += 1,
            ChannelEvent::Error(prlive_channel::ChannelError::ReconnectExhausted { attempts }) => {
                assert_eq!(attempts, 1);
                break;
            }
            ChannelEvent::Error(_) => {}
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(disconnects, 2);
    assert!(!channel.has_pending_retry());
    channel.shutdown().await;
}
