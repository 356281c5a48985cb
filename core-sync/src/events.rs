//! Sync lifecycle notifications.
//!
//! A small synchronous event bus: listeners register per event kind and are
//! invoked inline during `emit`. The registry is an explicit insertion-ordered
//! list — delivery order equals registration order as a documented contract,
//! not a side effect of any map's iteration behavior.
//!
//! A panicking listener is isolated: it is caught, logged, and the remaining
//! listeners still run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tracing::error;

use crate::conflict_resolver::Conflict;
use crate::manager::SyncReport;

/// Lifecycle notifications emitted by the sync manager.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A sync cycle passed its guards and entered `InProgress`.
    Started,
    /// A sync cycle finished; carries the aggregated report.
    Completed(SyncReport),
    /// A divergent key was deferred under the manual strategy.
    ConflictDetected(Conflict),
    /// A precondition or adapter failure was recorded.
    Error { message: String },
}

impl SyncEvent {
    pub fn kind(&self) -> SyncEventKind {
        match self {
            SyncEvent::Started => SyncEventKind::Started,
            SyncEvent::Completed(_) => SyncEventKind::Completed,
            SyncEvent::ConflictDetected(_) => SyncEventKind::ConflictDetected,
            SyncEvent::Error { .. } => SyncEventKind::Error,
        }
    }
}

/// Registration key for listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncEventKind {
    Started,
    Completed,
    ConflictDetected,
    Error,
}

/// Handle returned by [`EventBus::on`], consumed by [`EventBus::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&SyncEvent) + Send + Sync>;

struct ListenerEntry {
    id: ListenerId,
    kind: SyncEventKind,
    callback: Listener,
}

#[derive(Default)]
struct Registry {
    entries: Vec<ListenerEntry>,
    next_id: u64,
}

/// Synchronous event bus with an insertion-ordered listener registry.
#[derive(Default)]
pub struct EventBus {
    registry: Mutex<Registry>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one event kind.
    ///
    /// Listeners for the same kind fire in registration order.
    pub fn on<F>(&self, kind: SyncEventKind, listener: F) -> ListenerId
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().expect("listener registry poisoned");
        registry.next_id += 1;
        let id = ListenerId(registry.next_id);
        registry.entries.push(ListenerEntry {
            id,
            kind,
            callback: Arc::new(listener),
        });
        id
    }

    /// Remove a previously registered listener.
    ///
    /// Returns `false` when the id is unknown (already removed).
    pub fn off(&self, kind: SyncEventKind, id: ListenerId) -> bool {
        let mut registry = self.registry.lock().expect("listener registry poisoned");
        let before = registry.entries.len();
        registry
            .entries
            .retain(|entry| !(entry.kind == kind && entry.id == id));
        registry.entries.len() != before
    }

    /// Synchronously invoke all listeners registered for the event's kind.
    ///
    /// Listener panics are caught per listener so one failing listener can
    /// never starve the ones registered after it.
    pub fn emit(&self, event: &SyncEvent) {
        let kind = event.kind();
        // Snapshot outside the lock so listeners may call on/off re-entrantly.
        let listeners: Vec<Listener> = {
            let registry = self.registry.lock().expect("listener registry poisoned");
            registry
                .entries
                .iter()
                .filter(|entry| entry.kind == kind)
                .map(|entry| Arc::clone(&entry.callback))
                .collect()
        };

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                error!(?kind, "sync event listener panicked");
            }
        }
    }

    /// Drop every registered listener.
    pub fn clear(&self) {
        self.registry
            .lock()
            .expect("listener registry poisoned")
            .entries
            .clear();
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: SyncEventKind) -> usize {
        self.registry
            .lock()
            .expect("listener registry poisoned")
            .entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .count()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.lock().expect("listener registry poisoned");
        f.debug_struct("EventBus")
            .field("listeners", &registry.entries.len())
            .finish()
    }
}
