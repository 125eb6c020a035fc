use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use prlive_channel::ChannelEvent;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// One line of `--format json` output.
#[derive(Serialize, Debug, PartialEq)]
struct EventOutput<'a> {
    event: &'a str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    timestamp: u64,
}

impl<'a> EventOutput<'a> {
    fn new(event: &'a ChannelEvent) -> Self {
        let mut out = Self {
            event: event.name().as_str(),
            kind: event.wire_type(),
            payload: event.payload(),
            code: None,
            reason: None,
            error: None,
            timestamp: now_unix_seconds(),
        };
        match event {
            ChannelEvent::Disconnected { code, reason } => {
                out.code = *code;
                out.reason = reason.as_deref();
            }
            ChannelEvent::Error(err) => out.error = Some(err.to_string()),
            _ => {}
        }
        out
    }
}

pub fn print_event(event: &ChannelEvent, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&EventOutput::new(event)).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["EVENT", "TYPE", "DETAIL"])
                .add_row(vec![
                    event.name().to_string(),
                    event.wire_type().unwrap_or("-").to_string(),
                    detail(event),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let name = event.name();
            match event.wire_type() {
                Some(kind) => println!("{name} type={kind} {}", detail(event)),
                None if detail(event).is_empty() => println!("{name}"),
                None => println!("{name} {}", detail(event)),
            }
        }
        OutputFormat::Raw => {
            // Payloads only; lifecycle events have none.
            if let Some(payload) = event.payload() {
                let mut out = std::io::stdout();
                let _ = writeln!(out, "{payload}");
                let _ = out.flush();
            }
        }
    }
}

fn detail(event: &ChannelEvent) -> String {
    match event {
        ChannelEvent::Disconnected { code, reason } => match (code, reason) {
            (Some(code), Some(reason)) => format!("code={code} reason={reason}"),
            (Some(code), None) => format!("code={code}"),
            (None, Some(reason)) => format!("reason={reason}"),
            (None, None) => String::new(),
        },
        ChannelEvent::Error(err) => err.to_string(),
        other => other.payload().map(Value::to_string).unwrap_or_default(),
    }
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use prlive_channel::ChannelError;
    use prlive_frame::Envelope;
    use serde_json::json;

    use super::*;

    fn json_line(event: &ChannelEvent) -> Value {
        let mut value = serde_json::to_value(EventOutput::new(event)).unwrap();
        value.as_object_mut().unwrap().remove("timestamp");
        value
    }

    #[test]
    fn json_output_for_inbound_events() {
        assert_eq!(
            json_line(&ChannelEvent::NewComment(json!({ "prId": 7 }))),
            json!({ "event": "newComment", "type": "new_comment", "payload": { "prId": 7 } })
        );
        assert_eq!(
            json_line(&ChannelEvent::Message(Envelope::new("subscribed", json!({ "pr_id": 1 })))),
            json!({ "event": "message", "type": "subscribed", "payload": { "pr_id": 1 } })
        );
    }

    #[test]
    fn json_output_for_lifecycle_events() {
        assert_eq!(json_line(&ChannelEvent::Connected), json!({ "event": "connected" }));
        assert_eq!(
            json_line(&ChannelEvent::Disconnected {
                code: Some(4001),
                reason: Some("Unauthorized".into())
            }),
            json!({ "event": "disconnected", "code": 4001, "reason": "Unauthorized" })
        );
        assert_eq!(
            json_line(&ChannelEvent::Error(ChannelError::ReconnectExhausted { attempts: 5 })),
            json!({ "event": "error", "error": "gave up reconnecting after 5 attempts" })
        );
    }

    #[test]
    fn detail_formats_close_info() {
        let event = ChannelEvent::Disconnected {
            code: Some(1000),
            reason: None,
        };
        assert_eq!(detail(&event), "code=1000");
        assert_eq!(detail(&ChannelEvent::PrUpdate(json!({ "a": 1 }))), r#"{"a":1}"#);
    }
}
