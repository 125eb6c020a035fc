//! Subscriber registry: event name to an ordered list of handlers.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{trace, warn};

use crate::event::{ChannelEvent, EventName};

/// A subscriber callback.
pub type Handler = Arc<dyn Fn(&ChannelEvent) + Send + Sync>;

/// Returned by [`Subscribers::on`]; pass it to [`Subscribers::off`] to remove
/// the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<EventName, Vec<(SubscriptionId, Handler)>>,
}

/// Shared subscriber registry.
///
/// Clones share the same registry. Emission snapshots the handler list and
/// releases the lock before invoking anything, so handlers may call `on` and
/// `off` freely; such changes take effect from the next emission.
#[derive(Clone, Default)]
pub struct Subscribers {
    inner: Arc<Mutex<Registry>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `name`. Handlers run in registration order.
    pub fn on<F>(&self, name: EventName, handler: F) -> SubscriptionId
    where
        F: Fn(&ChannelEvent) + Send + Sync + 'static,
    {
        let mut registry = self.lock();
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry
            .handlers
            .entry(name)
            .or_default()
            .push((id, Arc::new(handler)));
        trace!(event = %name, "handler registered");
        id
    }

    /// Remove a handler. Returns false if it was already removed.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut registry = self.lock();
        for handlers in registry.handlers.values_mut() {
            if let Some(pos) = handlers.iter().position(|(existing, _)| *existing == id) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of handlers registered for `name`.
    pub fn handler_count(&self, name: EventName) -> usize {
        self.lock().handlers.get(&name).map_or(0, Vec::len)
    }

    /// Deliver `event` to every handler registered for its name at the time
    /// of the call. Returns the number of handlers invoked.
    ///
    /// A panicking handler is logged and skipped; the remaining handlers
    /// still run.
    pub fn emit(&self, event: &ChannelEvent) -> usize {
        let name = event.name();
        let snapshot: Vec<Handler> = match self.lock().handlers.get(&name) {
            Some(handlers) => handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
            None => return 0,
        };

        for handler in &snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                warn!(event = %name, "event handler panicked");
            }
        }
        snapshot.len()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.lock();
        let mut dbg = f.debug_map();
        for (name, handlers) in &registry.handlers {
            dbg.entry(&name.as_str(), &handlers.len());
        }
        dbg.finish()
    }
}
