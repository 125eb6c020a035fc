//! In-memory connector and scheduler for unit tests.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use prlive_transport::{
    Connector, EventSink, Result as TransportResult, SharedSink, Socket, SocketId,
    TransportError, TransportEvent,
};

use crate::manager::{Scheduler, TimerId};

/// Sink that drops everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn deliver(&self, _socket: SocketId, _event: TransportEvent) {}
}

#[derive(Default)]
struct ConnectorState {
    fail_opens: bool,
    fail_writes: bool,
    attempts: usize,
    opened: Vec<(SocketId, String, SharedSink)>,
    closed: Vec<SocketId>,
    writes: Vec<(SocketId, String)>,
}

/// Records every open, write and close. Clones share state.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl MockConnector {
    fn lock(&self) -> MutexGuard<'_, ConnectorState> {
        self.state.lock().unwrap()
    }

    pub fn fail_opens(&self, fail: bool) {
        self.lock().fail_opens = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Opens attempted, including failed ones.
    pub fn open_attempts(&self) -> usize {
        self.lock().attempts
    }

    /// Sockets successfully opened.
    pub fn open_count(&self) -> usize {
        self.lock().opened.len()
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.lock().opened.iter().map(|(_, url, _)| url.clone()).collect()
    }

    pub fn last_opened(&self) -> Option<SocketId> {
        self.lock().opened.last().map(|(id, _, _)| *id)
    }

    pub fn is_closed(&self, id: SocketId) -> bool {
        self.lock().closed.contains(&id)
    }

    pub fn writes(&self) -> Vec<(SocketId, String)> {
        self.lock().writes.clone()
    }

    /// Deliver `event` as if the transport for `id` produced it.
    pub fn deliver(&self, id: SocketId, event: TransportEvent) {
        let sink = self
            .lock()
            .opened
            .iter()
            .find(|(opened, _, _)| *opened == id)
            .map(|(_, _, sink)| sink.clone());
        if let Some(sink) = sink {
            sink.deliver(id, event);
        }
    }
}

impl Connector for MockConnector {
    fn open(&mut self, url: &str, id: SocketId, sink: SharedSink) -> TransportResult<Box<dyn Socket>> {
        let mut state = self.lock();
        state.attempts += 1;
        if state.fail_opens {
            return Err(TransportError::InvalidUrl {
                url: url.to_string(),
                reason: "refused by test".to_string(),
            });
        }
        state.opened.push((id, url.to_string(), sink));
        Ok(Box::new(MockSocket {
            id,
            state: self.state.clone(),
        }))
    }
}

struct MockSocket {
    id: SocketId,
    state: Arc<Mutex<ConnectorState>>,
}

impl Socket for MockSocket {
    fn id(&self) -> SocketId {
        self.id
    }

    fn send_text(&mut self, text: String) -> TransportResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(TransportError::Closed(self.id));
        }
        state.writes.push((self.id, text));
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.state.lock().unwrap();
        if !state.closed.contains(&self.id) {
            state.closed.push(self.id);
        }
    }
}

#[derive(Default)]
struct SchedulerState {
    armed: Vec<(TimerId, Duration)>,
    total: usize,
}

/// Records armed timers; tests fire them by hand.
#[derive(Clone, Default)]
pub struct MockScheduler {
    state: Arc<Mutex<SchedulerState>>,
}

impl MockScheduler {
    /// Timers currently armed, oldest first.
    pub fn armed(&self) -> Vec<(TimerId, Duration)> {
        self.state.lock().unwrap().armed.clone()
    }

    /// Disarm the oldest timer and return it, as if it had elapsed.
    pub fn fire_next(&self) -> Option<TimerId> {
        let mut state = self.state.lock().unwrap();
        if state.armed.is_empty() {
            return None;
        }
        Some(state.armed.remove(0).0)
    }

    pub fn total_scheduled(&self) -> usize {
        self.state.lock().unwrap().total
    }
}

impl Scheduler for MockScheduler {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        let mut state = self.state.lock().unwrap();
        state.armed.push((id, delay));
        state.total += 1;
    }

    fn cancel(&mut self, id: TimerId) {
        self.state.lock().unwrap().armed.retain(|(armed, _)| *armed != id);
    }
}
