//! Indexed registry of message observers.
//!
//! Handlers are keyed by opaque monotonically increasing ids, so removal is
//! by identity and never disturbs other entries, and iteration order is
//! registration order. Fan-out works on a snapshot taken at the start of a
//! pass, which lets handlers register or unregister (themselves included)
//! while a pass is in flight.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::event::SessionEvent;

/// Observer callback invoked once per dispatched payload.
///
/// An `Err` marks the invocation as failed; the dispatcher logs it and
/// carries on with the rest of the pass.
pub type EventHandler = Arc<dyn Fn(SessionEvent) -> anyhow::Result<()> + Send + Sync>;

/// Opaque registration token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(u64);

/// Insertion-ordered handler storage.
///
/// Duplicates are allowed: registering the same callback twice yields two
/// independent entries with distinct ids.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<u64, EventHandler>,
    next_id: u64,
}

impl HandlerRegistry {
    pub fn insert(&mut self, handler: EventHandler) -> HandlerId {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers.insert(id, handler);
        HandlerId(id)
    }

    /// Remove a registration. Returns false when the id was already gone,
    /// which makes repeated removal a no-op.
    pub fn remove(&mut self, id: HandlerId) -> bool {
        self.handlers.remove(&id.0).is_some()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Copy of the current handlers in registration order, for one fan-out
    /// pass.
    pub fn snapshot(&self) -> Vec<EventHandler> {
        self.handlers.values().cloned().collect()
    }
}
