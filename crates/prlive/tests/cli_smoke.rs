#![cfg(feature = "cli")]

use std::process::{Command, Output};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

const TIMEOUT: Duration = Duration::from_secs(10);

fn prlive(args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_prlive"));
    cmd.env_remove("PRLIVE_URL")
        .env_remove("PRLIVE_TOKEN")
        .arg("--log-level")
        .arg("off")
        .args(args);
    cmd
}

async fn run(mut cmd: Command) -> Output {
    let output = tokio::task::spawn_blocking(move || cmd.output().expect("prlive should run"));
    timeout(TIMEOUT, output)
        .await
        .expect("prlive should exit in time")
        .expect("runner should not panic")
}

async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{addr}/ws")
}

#[test]
fn version_prints_name_and_version() {
    let output = prlive(&["version"]).output().expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("prlive {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_url_is_usage_error() {
    let output = prlive(&["analyze", "--pr", "1"])
        .output()
        .expect("analyze should run");
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no server address"));
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let url = dead_url().await;
    let output = run(prlive(&[
        "analyze",
        "--url",
        &url,
        "--pr",
        "1",
        "--reconnect-attempts",
        "1",
        "--reconnect-interval",
        "50ms",
    ]))
    .await;

    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("gave up reconnecting"));
}

#[tokio::test]
async fn comment_reaches_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let mut received = Vec::new();
        while let Some(Ok(message)) = ws.next().await {
            match message {
                Message::Text(text) => received.push(text.as_str().to_owned()),
                Message::Close(_) => break,
                _ => {}
            }
        }
        received
    });

    let url = format!("ws://{addr}/ws");
    let output = run(prlive(&[
        "comment",
        "--url",
        &url,
        "--pr",
        "7",
        "--line",
        "12",
        "please rename",
    ]))
    .await;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let received = timeout(TIMEOUT, server).await.unwrap().unwrap();
    assert_eq!(
        received,
        vec![r#"{"type":"new_comment","payload":{"comment":"please rename","lineNumber":12,"prId":7}}"#.to_string()]
    );
}

#[tokio::test]
async fn listen_subscribes_and_prints_filtered_events() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        let subscribe = match ws.next().await {
            Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
            other => panic!("expected subscribe_pr, got {other:?}"),
        };
        ws.send(Message::text(r#"{"type":"subscribed","payload":{"pr_id":3}}"#))
            .await
            .unwrap();
        ws.send(Message::text(r#"{"type":"pr_update","payload":{"prId":3,"status":"merged"}}"#))
            .await
            .unwrap();

        let mut rest = Vec::new();
        while let Some(Ok(message)) = ws.next().await {
            match message {
                Message::Text(text) => rest.push(text.as_str().to_owned()),
                Message::Close(_) => break,
                _ => {}
            }
        }
        (subscribe, rest)
    });

    let url = format!("ws://{addr}/ws");
    let output = run(prlive(&[
        "--format",
        "json",
        "listen",
        "--url",
        &url,
        "--pr",
        "3",
        "--events",
        "prUpdate",
        "--count",
        "1",
    ]))
    .await;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1, "stdout: {stdout}");
    assert!(lines[0].contains(r#""event":"prUpdate""#));
    assert!(lines[0].contains(r#""status":"merged""#));

    let (subscribe, rest) = timeout(TIMEOUT, server).await.unwrap().unwrap();
    assert_eq!(subscribe, r#"{"type":"subscribe_pr","payload":{"prId":3}}"#);
    assert_eq!(rest, vec![r#"{"type":"unsubscribe_pr","payload":{"prId":3}}"#.to_string()]);
}

#[tokio::test]
async fn server_error_reply_fails_the_command() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        if let Some(Ok(Message::Text(_))) = ws.next().await {
            ws.send(Message::text(
                r#"{"type":"analysis_error","payload":{"analysis_id":1,"pr_id":9,"error":"repository unavailable"}}"#,
            ))
            .await
            .unwrap();
        }
        while let Some(Ok(message)) = ws.next().await {
            if let Message::Close(_) = message {
                break;
            }
        }
    });

    let url = format!("ws://{addr}/ws");
    let output = run(prlive(&[
        "--format", "json", "analyze", "--url", &url, "--pr", "9", "--wait",
    ]))
    .await;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains(r#""type":"analysis_error""#));
    assert!(String::from_utf8_lossy(&output.stderr).contains("repository unavailable"));
    timeout(TIMEOUT, server).await.unwrap().unwrap();
}
