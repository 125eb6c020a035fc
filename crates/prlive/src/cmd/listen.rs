use prlive_channel::{Channel, ChannelError, ChannelEvent, EventName};
use tracing::info;

use crate::cmd::session::Session;
use crate::cmd::ListenArgs;
use crate::exit::{channel_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_event, OutputFormat};

pub async fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = Session::open(&args.connect).await?;
    let mut printer = Printer::new(&args, format);

    subscribe_all(&session.channel, &args.prs);
    if printer.print(&ChannelEvent::Connected) {
        return close(session, &args.prs).await;
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted");
                return close(session, &args.prs).await;
            }
            event = session.events.recv() => {
                let Some(event) = event else {
                    return Err(CliError::new(INTERNAL, "channel stopped unexpectedly"));
                };

                if event == ChannelEvent::Connected {
                    // A reconnect starts a fresh server session.
                    subscribe_all(&session.channel, &args.prs);
                }
                if printer.print(&event) {
                    return close(session, &args.prs).await;
                }
                if let ChannelEvent::Error(err @ ChannelError::ReconnectExhausted { .. }) = &event {
                    session.close().await;
                    return Err(channel_error("connection lost", err));
                }
            }
        }
    }
}

fn subscribe_all(channel: &Channel, prs: &[u64]) {
    for &pr in prs {
        channel.subscribe_pr(pr);
    }
}

async fn close(session: Session, prs: &[u64]) -> CliResult<i32> {
    if session.channel.state() == prlive_channel::ConnectionState::Open {
        for &pr in prs {
            session.channel.unsubscribe_pr(pr);
        }
    }
    session.close().await;
    Ok(SUCCESS)
}

/// Applies the event filter and the `--count` limit.
struct Printer {
    filter: Vec<EventName>,
    remaining: Option<usize>,
    format: OutputFormat,
}

impl Printer {
    fn new(args: &ListenArgs, format: OutputFormat) -> Self {
        Self {
            filter: args.events.clone(),
            remaining: args.count,
            format,
        }
    }

    fn wants(&self, event: &ChannelEvent) -> bool {
        self.filter.is_empty() || self.filter.contains(&event.name())
    }

    /// Print `event` if it passes the filter. Returns true once the count
    /// limit is reached.
    fn print(&mut self, event: &ChannelEvent) -> bool {
        if !self.wants(event) {
            return false;
        }
        print_event(event, self.format);
        match self.remaining.as_mut() {
            Some(remaining) => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn printer(events: Vec<EventName>, count: Option<usize>) -> Printer {
        Printer {
            filter: events,
            remaining: count,
            format: OutputFormat::Raw,
        }
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let printer = printer(Vec::new(), None);
        assert!(printer.wants(&ChannelEvent::Connected));
        assert!(printer.wants(&ChannelEvent::PrUpdate(json!({}))));
    }

    #[test]
    fn filter_limits_events() {
        let printer = printer(vec![EventName::NewComment], None);
        assert!(printer.wants(&ChannelEvent::NewComment(json!({}))));
        assert!(!printer.wants(&ChannelEvent::PrUpdate(json!({}))));
        assert!(!printer.wants(&ChannelEvent::Connected));
    }

    #[test]
    fn count_stops_after_matching_events_only() {
        let mut printer = printer(vec![EventName::PrUpdate], Some(2));
        assert!(!printer.print(&ChannelEvent::Connected));
        assert!(!printer.print(&ChannelEvent::PrUpdate(json!(1))));
        assert!(!printer.print(&ChannelEvent::NewComment(json!(2))));
        assert!(printer.print(&ChannelEvent::PrUpdate(json!(3))));
    }
}
